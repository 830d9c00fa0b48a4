//! # Host Bridge Traits
//!
//! Platform seams between the playback session core and the host.
//!
//! ## Overview
//!
//! The core never talks to audio hardware or to the platform's focus service
//! directly. Each capability it needs is a trait here, implemented per
//! platform (desktop defaults live in `bridge-desktop`; Android and iOS hosts
//! inject their own adapters).
//!
//! ## Traits
//!
//! - [`NativeEngine`](engine::NativeEngine) - lifecycle of the opaque real-time engine
//! - [`EngineListener`](engine::EngineListener) - asynchronous engine confirmations
//! - [`FocusArbiter`](focus::FocusArbiter) - audio focus requests and abandonment
//! - [`FocusListener`](focus::FocusListener) - asynchronous focus changes
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to the host
//!
//! ## Data
//!
//! [`StreamConfig`](playback::StreamConfig) and its attribute enums are plain
//! immutable values shared by the core and every bridge.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`. Listener callbacks may arrive on
//! any thread, including real-time audio threads, so implementations of the
//! listener traits must not block.

pub mod engine;
pub mod error;
pub mod focus;
pub mod logging;
pub mod playback;

pub use error::{BridgeError, Result};

pub use engine::{EngineHandle, EngineListener, NativeEngine};
pub use focus::{FocusArbiter, FocusChange, FocusGain, FocusListener, FocusRequest, FocusToken};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    ContentType, ParseAttributeError, PerformanceMode, SharingMode, StreamConfig,
    StreamConfigBuilder, Usage, DEFAULT_SOURCE_PATH,
};

//! # Playback Session Core
//!
//! Manages a single real-time audio playback session.
//!
//! ## Overview
//!
//! This crate handles:
//! - The session state machine (`Idle → Starting → Playing → Stopping → Idle`)
//! - Audio focus requests around start and stop, and stopping on focus loss
//! - Applying immutable stream configurations to the native engine
//! - Translating asynchronous engine callbacks into state transitions
//! - Loading the list of offered configurations
//!
//! Platform access goes through the traits in `bridge-traits`; runtime
//! settings, logging and the event bus come from `core-runtime`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod observer;
pub mod session;
pub mod state;

pub use catalog::{ConfigCatalog, ConfigOrigin, ConfigSources};
pub use config::validate_config;
pub use error::{Result, SessionError};
pub use observer::{NoopObserver, SessionObserver};
pub use session::PlaybackSession;
pub use state::SessionState;

//! # Core Runtime Module
//!
//! Ambient infrastructure shared by the playback session core:
//! - Logging and tracing setup (`logging`)
//! - Fail-fast runtime configuration (`config`)
//! - Broadcast event bus (`events`)
//!
//! ## Overview
//!
//! Nothing here knows about the session state machine. The session crate
//! depends on this one for its bridges, timeouts and event fan-out, and hosts
//! call [`logging::init_logging`] once at startup.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream, FocusEvent, SessionEvent};

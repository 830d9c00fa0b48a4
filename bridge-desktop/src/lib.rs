//! # Desktop Bridge Implementations
//!
//! Default implementations of the playback bridge traits for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `WavEngine`: a `NativeEngine` that decodes WAV files with `hound` and
//!   renders them on a dedicated stream thread
//! - `LocalFocusArbiter`: a `FocusArbiter` that arbitrates between sessions
//!   of one process
//! - `attributes`: the numeric AAudio codes behind the semantic stream
//!   attributes, plus buffer sizing
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LocalFocusArbiter, WavEngine};
//! use core_runtime::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .engine(Arc::new(WavEngine::new()))
//!     .focus_arbiter(Arc::new(LocalFocusArbiter::new()))
//!     .build()?;
//! ```

pub mod attributes;
mod engine;
mod focus;

pub use attributes::{BufferPlan, StreamAttributes};
pub use engine::WavEngine;
pub use focus::LocalFocusArbiter;

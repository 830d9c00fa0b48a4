//! Workspace facade crate.
//!
//! Re-exports the session core and its bridge contracts so host applications
//! can depend on `cadence` alone. The `desktop-shims` feature (default) also
//! exposes the desktop engine and focus arbiter.

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_playback::{PlaybackSession, SessionError, SessionObserver, SessionState};

//! Native engine binding.
//!
//! The engine is the opaque real-time component that renders samples to the
//! output device. The session core drives it through a narrow lifecycle:
//!
//! ```text
//! ensure_loaded ─> initialize ─> apply_configuration* ─> (start ─> stop)* ─> release
//! ```
//!
//! `start` only reports whether the request was well-formed. Whether output
//! really began arrives later through [`EngineListener`], called from a
//! thread the caller does not control (the audio callback thread or an
//! engine-owned worker). Callers must not assume those callbacks are
//! serialized with their own calls into the engine.
//!
//! Mapping the semantic attributes of [`StreamConfig`] to platform numeric
//! codes is the implementation's job.

use crate::error::Result;
use crate::playback::StreamConfig;
use std::sync::Arc;

/// Opaque handle to an initialized engine instance.
///
/// Not `Clone`. [`NativeEngine::release`] consumes it, so a handle cannot be
/// used after release without going around the type system.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Mint a handle. Only engine implementations should call this.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Asynchronous notifications from the engine.
pub trait EngineListener: Send + Sync {
    /// Output is running.
    fn on_started(&self);

    /// Output has stopped, either on request or at end of stream.
    fn on_stopped(&self);

    /// The stream failed. No further output happens until the next start.
    fn on_error(&self, reason: &str);
}

/// Lifecycle contract of the native engine.
pub trait NativeEngine: Send + Sync {
    /// Process-wide setup (library load, backend probing). Idempotent; the
    /// engine owns it, callers only make sure it ran.
    fn ensure_loaded(&self) -> Result<()> {
        Ok(())
    }

    /// Create an engine instance that reports to `listener`.
    fn initialize(&self, listener: Arc<dyn EngineListener>) -> Result<EngineHandle>;

    /// Apply stream parameters for the next start. An `Err` means the engine
    /// rejected the configuration.
    fn apply_configuration(&self, handle: &EngineHandle, config: &StreamConfig) -> Result<()>;

    /// Request output to start. `Ok` means accepted; confirmation arrives via
    /// [`EngineListener::on_started`] or [`EngineListener::on_error`].
    fn start(&self, handle: &EngineHandle) -> Result<()>;

    /// Request output to stop. Must be safe while a start is still pending
    /// and when nothing is running.
    fn stop(&self, handle: &EngineHandle);

    /// Destroy the instance.
    fn release(&self, handle: EngineHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_exposes_id() {
        let handle = EngineHandle::new(42);
        assert_eq!(handle.id(), 42);
        assert_eq!(handle, EngineHandle::new(42));
    }
}

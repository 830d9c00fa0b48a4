//! # Runtime Configuration
//!
//! Builder for the dependencies and settings a playback session needs.
//!
//! ## Overview
//!
//! A [`CoreConfig`] bundles the two required bridges (the native engine and
//! the focus arbiter) with the session's safeguard timeouts and event fan-out
//! settings. The builder fails fast: a missing bridge is reported with an
//! actionable [`Error::CapabilityMissing`] instead of surfacing later as a
//! runtime failure.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .engine(Arc::new(WavEngine::new()))
//!     .focus_arbiter(Arc::new(LocalFocusArbiter::new()))
//!     .stop_timeout(Duration::from_secs(1))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No engine and no arbiter: fails with an actionable message
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FocusArbiter, NativeEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default location of the host-provided configuration override file.
pub const DEFAULT_CONFIG_OVERRIDE_PATH: &str = "/data/aaudio_player_configs.json";

/// Default time an engine has to confirm a start.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time an engine has to confirm a stop.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Default capacity of the session event bus.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Dependencies and settings for a playback session.
#[derive(Clone)]
pub struct CoreConfig {
    /// Native engine binding (required)
    pub engine: Arc<dyn NativeEngine>,

    /// Audio focus arbiter (required)
    pub focus_arbiter: Arc<dyn FocusArbiter>,

    /// A session still `Starting` after this long is failed and returned to idle
    pub start_timeout: Duration,

    /// A session still `Stopping` after this long is forced to idle
    pub stop_timeout: Duration,

    /// Capacity of the broadcast event bus
    pub event_buffer_size: usize,

    /// Configuration file consulted before the bundled defaults
    pub config_override_path: PathBuf,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine", &"<NativeEngine>")
            .field("focus_arbiter", &"<FocusArbiter>")
            .field("start_timeout", &self.start_timeout)
            .field("stop_timeout", &self.stop_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("config_override_path", &self.config_override_path)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate settings that the builder cannot check by type.
    pub fn validate(&self) -> Result<()> {
        if self.start_timeout.is_zero() {
            return Err(Error::Config("start_timeout must be greater than zero".into()));
        }

        if self.stop_timeout.is_zero() {
            return Err(Error::Config("stop_timeout must be greater than zero".into()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than zero".into(),
            ));
        }

        if self.config_override_path.as_os_str().is_empty() {
            return Err(Error::Config("config_override_path must not be empty".into()));
        }

        Ok(())
    }

    pub fn config_override_path(&self) -> &Path {
        &self.config_override_path
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine: Option<Arc<dyn NativeEngine>>,
    focus_arbiter: Option<Arc<dyn FocusArbiter>>,
    start_timeout: Option<Duration>,
    stop_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    config_override_path: Option<PathBuf>,
}

impl CoreConfigBuilder {
    /// Set the native engine binding (required).
    pub fn engine(mut self, engine: Arc<dyn NativeEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the audio focus arbiter (required).
    pub fn focus_arbiter(mut self, arbiter: Arc<dyn FocusArbiter>) -> Self {
        self.focus_arbiter = Some(arbiter);
        self
    }

    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = Some(timeout);
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn config_override_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_override_path = Some(path.into());
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when the engine or the focus arbiter is absent
    /// - [`Error::Config`] when a setting is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let engine = self.engine.ok_or_else(|| {
            Error::capability_missing(
                "NativeEngine",
                "No engine binding provided. Desktop: enable the `desktop-shims` feature \
                 and pass `bridge_desktop::WavEngine`. Mobile: inject the platform engine adapter.",
            )
        })?;

        let focus_arbiter = self.focus_arbiter.ok_or_else(|| {
            Error::capability_missing(
                "FocusArbiter",
                "No focus arbiter provided. Desktop: pass `bridge_desktop::LocalFocusArbiter`. \
                 Mobile: inject an adapter over the platform audio focus service.",
            )
        })?;

        let config = CoreConfig {
            engine,
            focus_arbiter,
            start_timeout: self.start_timeout.unwrap_or(DEFAULT_START_TIMEOUT),
            stop_timeout: self.stop_timeout.unwrap_or(DEFAULT_STOP_TIMEOUT),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            config_override_path: self
                .config_override_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_OVERRIDE_PATH)),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        EngineHandle, EngineListener, FocusListener, FocusRequest, FocusToken, StreamConfig,
    };

    struct NoopEngine;

    impl NativeEngine for NoopEngine {
        fn initialize(&self, _listener: Arc<dyn EngineListener>) -> bridge_traits::Result<EngineHandle> {
            Ok(EngineHandle::new(1))
        }

        fn apply_configuration(
            &self,
            _handle: &EngineHandle,
            _config: &StreamConfig,
        ) -> bridge_traits::Result<()> {
            Ok(())
        }

        fn start(&self, _handle: &EngineHandle) -> bridge_traits::Result<()> {
            Ok(())
        }

        fn stop(&self, _handle: &EngineHandle) {}

        fn release(&self, _handle: EngineHandle) {}
    }

    struct GrantingArbiter;

    impl FocusArbiter for GrantingArbiter {
        fn request_focus(
            &self,
            _request: &FocusRequest,
            _listener: Arc<dyn FocusListener>,
        ) -> bridge_traits::Result<Option<FocusToken>> {
            Ok(Some(FocusToken::new(1)))
        }

        fn abandon_focus(&self, _token: FocusToken) {}
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .engine(Arc::new(NoopEngine))
            .focus_arbiter(Arc::new(GrantingArbiter))
    }

    #[test]
    fn test_defaults_applied() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.start_timeout, DEFAULT_START_TIMEOUT);
        assert_eq!(config.stop_timeout, DEFAULT_STOP_TIMEOUT);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(
            config.config_override_path(),
            Path::new(DEFAULT_CONFIG_OVERRIDE_PATH)
        );
    }

    #[test]
    fn test_overrides_applied() {
        let config = complete_builder()
            .start_timeout(Duration::from_millis(250))
            .stop_timeout(Duration::from_millis(100))
            .event_buffer_size(8)
            .config_override_path("/tmp/configs.json")
            .build()
            .unwrap();

        assert_eq!(config.start_timeout, Duration::from_millis(250));
        assert_eq!(config.stop_timeout, Duration::from_millis(100));
        assert_eq!(config.event_buffer_size, 8);
        assert_eq!(config.config_override_path(), Path::new("/tmp/configs.json"));
    }

    #[test]
    fn test_missing_engine_fails_fast() {
        let result = CoreConfig::builder()
            .focus_arbiter(Arc::new(GrantingArbiter))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "NativeEngine");
                assert!(message.contains("desktop-shims"));
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_arbiter_fails_fast() {
        let result = CoreConfig::builder().engine(Arc::new(NoopEngine)).build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "FocusArbiter"
        ));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(matches!(
            complete_builder().start_timeout(Duration::ZERO).build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            complete_builder().stop_timeout(Duration::ZERO).build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            complete_builder().event_buffer_size(0).build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            complete_builder().config_override_path("").build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = complete_builder().build().unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<NativeEngine>"));
        assert!(rendered.contains("stop_timeout"));
    }
}

//! # Configuration Catalog
//!
//! Produces the ordered list of stream configurations a host offers to the
//! user. Index 0 is the default.
//!
//! ## Sources
//!
//! 1. An override file on the device, if it exists
//! 2. The defaults bundled into this crate
//! 3. A single hardcoded emergency configuration
//!
//! A source that fails to read or parse falls through to the emergency list.
//! Entries that would be rejected by [`validate_config`] are dropped, so the
//! catalog only ever yields playable configurations.
//!
//! ## Format
//!
//! ```json
//! {
//!   "configs": [
//!     {
//!       "usage": "AAUDIO_USAGE_MEDIA",
//!       "contentType": "AAUDIO_CONTENT_TYPE_MUSIC",
//!       "performanceMode": "AAUDIO_PERFORMANCE_MODE_LOW_LATENCY",
//!       "sharingMode": "AAUDIO_SHARING_MODE_SHARED",
//!       "audioFilePath": "/data/48k_2ch_16bit.wav",
//!       "description": "Media - Low Latency Music"
//!     }
//!   ]
//! }
//! ```
//!
//! Every field is optional and defaulted.

use crate::config::validate_config;
use crate::error::{Result, SessionError};

use bridge_traits::{
    ContentType, PerformanceMode, SharingMode, StreamConfig, Usage, DEFAULT_SOURCE_PATH,
};
use core_runtime::config::DEFAULT_CONFIG_OVERRIDE_PATH;
use core_runtime::logging::strip_path;
use core_runtime::CoreConfig;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Defaults compiled into the crate.
pub const BUNDLED_CONFIGS: &str = include_str!("../assets/session_configs.json");

pub const EMERGENCY_DESCRIPTION: &str = "Emergency Fallback - Media Playback";

const DEFAULT_ENTRY_DESCRIPTION: &str = "Custom Configuration";

/// Configuration used when no source produced a list.
pub fn emergency_config() -> StreamConfig {
    StreamConfig::builder(DEFAULT_SOURCE_PATH)
        .usage(Usage::Media)
        .content_type(ContentType::Music)
        .performance_mode(PerformanceMode::PowerSaving)
        .sharing_mode(SharingMode::Shared)
        .description(EMERGENCY_DESCRIPTION)
        .build()
}

// ============================================================================
// Sources
// ============================================================================

/// Where the catalog looks for configurations.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// Consulted first when the file exists.
    pub override_path: Option<PathBuf>,
    /// JSON document used when there is no override file.
    pub bundled: Option<String>,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            override_path: Some(PathBuf::from(DEFAULT_CONFIG_OVERRIDE_PATH)),
            bundled: Some(BUNDLED_CONFIGS.to_string()),
        }
    }
}

impl ConfigSources {
    /// Sources using the override path of a runtime configuration.
    pub fn from_core_config(config: &CoreConfig) -> Self {
        Self::default().with_override_path(config.config_override_path())
    }

    pub fn with_override_path(mut self, path: impl AsRef<Path>) -> Self {
        self.override_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_override(mut self) -> Self {
        self.override_path = None;
        self
    }

    pub fn with_bundled(mut self, json: impl Into<String>) -> Self {
        self.bundled = Some(json.into());
        self
    }

    pub fn without_bundled(mut self) -> Self {
        self.bundled = None;
        self
    }
}

/// Which source the current list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Override(PathBuf),
    Bundled,
    Emergency,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Override(path) => write!(f, "override file {}", path.display()),
            ConfigOrigin::Bundled => f.write_str("bundled defaults"),
            ConfigOrigin::Emergency => f.write_str("emergency fallback"),
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConfigFile {
    configs: Vec<ConfigEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigEntry {
    usage: Option<String>,
    content_type: Option<String>,
    performance_mode: Option<String>,
    sharing_mode: Option<String>,
    audio_file_path: Option<String>,
    description: Option<String>,
}

fn attribute_or<T>(value: Option<&str>, default: T, index: usize) -> T
where
    T: FromStr + Copy,
    T::Err: fmt::Display,
{
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            warn!(index, error = %err, "unrecognized attribute, using default");
            default
        }),
    }
}

impl ConfigEntry {
    fn into_config(self, index: usize) -> StreamConfig {
        StreamConfig::builder(
            self.audio_file_path
                .unwrap_or_else(|| DEFAULT_SOURCE_PATH.to_string()),
        )
        .usage(attribute_or(self.usage.as_deref(), Usage::Media, index))
        .content_type(attribute_or(
            self.content_type.as_deref(),
            ContentType::Music,
            index,
        ))
        .performance_mode(attribute_or(
            self.performance_mode.as_deref(),
            PerformanceMode::LowLatency,
            index,
        ))
        .sharing_mode(attribute_or(
            self.sharing_mode.as_deref(),
            SharingMode::Shared,
            index,
        ))
        .description(
            self.description
                .unwrap_or_else(|| DEFAULT_ENTRY_DESCRIPTION.to_string()),
        )
        .build()
    }
}

/// Parse a configuration document, dropping entries that fail validation.
///
/// # Errors
///
/// [`SessionError::Catalog`] if the document is not valid JSON or has no
/// `configs` array.
pub fn parse_configs(json: &str) -> Result<Vec<StreamConfig>> {
    let file: ConfigFile = serde_json::from_str(json)
        .map_err(|err| SessionError::Catalog(format!("invalid configuration document: {}", err)))?;

    Ok(file
        .configs
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let config = entry.into_config(index);
            match validate_config(&config) {
                Ok(()) => Some(config),
                Err(err) => {
                    warn!(index, description = config.description(), error = %err, "dropping configuration");
                    None
                }
            }
        })
        .collect())
}

// ============================================================================
// Catalog
// ============================================================================

/// Ordered list of playable configurations.
#[derive(Debug, Clone)]
pub struct ConfigCatalog {
    sources: ConfigSources,
    configs: Vec<StreamConfig>,
    origin: ConfigOrigin,
}

impl ConfigCatalog {
    /// Load from the first available source. Never fails: the emergency
    /// configuration is the last resort.
    pub fn load(sources: ConfigSources) -> Self {
        let (configs, origin) = Self::read(&sources);
        info!(count = configs.len(), origin = %origin, "loaded configurations");
        Self {
            sources,
            configs,
            origin,
        }
    }

    /// Re-read the sources, e.g. after the override file was edited.
    pub fn reload(&mut self) {
        let (configs, origin) = Self::read(&self.sources);
        info!(count = configs.len(), origin = %origin, "reloaded configurations");
        self.configs = configs;
        self.origin = origin;
    }

    fn read(sources: &ConfigSources) -> (Vec<StreamConfig>, ConfigOrigin) {
        let attempt = match sources.override_path.as_deref().filter(|path| path.exists()) {
            Some(path) => {
                info!(path = strip_path(&path.to_string_lossy()), "loading configuration override");
                std::fs::read_to_string(path)
                    .map_err(|err| SessionError::Catalog(format!("cannot read override: {}", err)))
                    .and_then(|json| parse_configs(&json))
                    .map(|configs| (configs, ConfigOrigin::Override(path.to_path_buf())))
            }
            None => match sources.bundled.as_deref() {
                Some(json) => parse_configs(json).map(|configs| (configs, ConfigOrigin::Bundled)),
                None => Err(SessionError::Catalog("no configuration source".to_string())),
            },
        };

        attempt.unwrap_or_else(|err| {
            warn!(error = %err, "using emergency configuration");
            (vec![emergency_config()], ConfigOrigin::Emergency)
        })
    }

    pub fn configs(&self) -> &[StreamConfig] {
        &self.configs
    }

    pub fn get(&self, index: usize) -> Option<&StreamConfig> {
        self.configs.get(index)
    }

    /// Index 0, or the emergency configuration when the list is empty.
    pub fn default_config(&self) -> StreamConfig {
        self.configs.first().cloned().unwrap_or_else(emergency_config)
    }

    pub fn find_by_description(&self, description: &str) -> Option<&StreamConfig> {
        self.configs
            .iter()
            .find(|config| config.description() == description)
    }

    pub fn origin(&self) -> &ConfigOrigin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

//! Stream configuration value types shared between the session core and the
//! platform engine.
//!
//! A [`StreamConfig`] describes how a single output stream should behave:
//! routing intent, content classification, latency/power tradeoff, sharing
//! policy and the source to play. Values are immutable once built; changing
//! playback parameters means building a new value (see
//! [`StreamConfig::to_builder`]).
//!
//! The attribute enums are closed and semantic. Their textual form uses the
//! platform spelling (`AAUDIO_USAGE_MEDIA`), and parsing also accepts the short
//! spelling (`MEDIA`) case-insensitively. Mapping to numeric platform codes is
//! the engine binding's concern and does not live here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Source played when a configuration does not name one.
pub const DEFAULT_SOURCE_PATH: &str = "/data/48k_2ch_16bit.wav";

/// Error returned when an attribute string does not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseAttributeError {
    pub kind: &'static str,
    pub value: String,
}

fn parse_attribute<T: Copy>(
    input: &str,
    kind: &'static str,
    prefix: &str,
    all: &[T],
    name: fn(T) -> &'static str,
    aliases: &[(&str, T)],
) -> Result<T, ParseAttributeError> {
    let upper = input.trim().to_ascii_uppercase();
    let bare = upper.strip_prefix(prefix).unwrap_or(&upper);

    all.iter()
        .copied()
        .find(|variant| name(*variant) == bare)
        .or_else(|| {
            aliases
                .iter()
                .find(|(alias, _)| *alias == bare)
                .map(|(_, variant)| *variant)
        })
        .ok_or_else(|| ParseAttributeError {
            kind,
            value: input.to_string(),
        })
}

// ============================================================================
// Routing intent
// ============================================================================

/// Declared purpose of the stream, used by the platform for volume and
/// ducking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    Media,
    VoiceCommunication,
    VoiceCommunicationSignalling,
    Alarm,
    Notification,
    NotificationRingtone,
    NotificationEvent,
    AssistanceAccessibility,
    AssistanceNavigationGuidance,
    AssistanceSonification,
    Game,
    Assistant,
}

impl Usage {
    pub const PREFIX: &'static str = "AAUDIO_USAGE_";

    pub const ALL: [Usage; 12] = [
        Usage::Media,
        Usage::VoiceCommunication,
        Usage::VoiceCommunicationSignalling,
        Usage::Alarm,
        Usage::Notification,
        Usage::NotificationRingtone,
        Usage::NotificationEvent,
        Usage::AssistanceAccessibility,
        Usage::AssistanceNavigationGuidance,
        Usage::AssistanceSonification,
        Usage::Game,
        Usage::Assistant,
    ];

    /// Name without the platform prefix.
    pub fn name(self) -> &'static str {
        match self {
            Usage::Media => "MEDIA",
            Usage::VoiceCommunication => "VOICE_COMMUNICATION",
            Usage::VoiceCommunicationSignalling => "VOICE_COMMUNICATION_SIGNALLING",
            Usage::Alarm => "ALARM",
            Usage::Notification => "NOTIFICATION",
            Usage::NotificationRingtone => "NOTIFICATION_RINGTONE",
            Usage::NotificationEvent => "NOTIFICATION_EVENT",
            Usage::AssistanceAccessibility => "ASSISTANCE_ACCESSIBILITY",
            Usage::AssistanceNavigationGuidance => "ASSISTANCE_NAVIGATION_GUIDANCE",
            Usage::AssistanceSonification => "ASSISTANCE_SONIFICATION",
            Usage::Game => "GAME",
            Usage::Assistant => "ASSISTANT",
        }
    }

    /// Whether streams with this usage are part of a call and must not be
    /// preempted by ordinary media.
    pub fn is_communication(self) -> bool {
        matches!(
            self,
            Usage::VoiceCommunication | Usage::VoiceCommunicationSignalling
        )
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.name())
    }
}

impl FromStr for Usage {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALIASES: [(&str, Usage); 4] = [
            ("RINGTONE", Usage::NotificationRingtone),
            ("ACCESSIBILITY", Usage::AssistanceAccessibility),
            ("NAVIGATION_GUIDANCE", Usage::AssistanceNavigationGuidance),
            ("SYSTEM_SONIFICATION", Usage::AssistanceSonification),
        ];
        parse_attribute(s, "usage", Self::PREFIX, &Self::ALL, Self::name, &ALIASES)
    }
}

// ============================================================================
// Content type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Speech,
    Music,
    Movie,
    Sonification,
}

impl ContentType {
    pub const PREFIX: &'static str = "AAUDIO_CONTENT_TYPE_";

    pub const ALL: [ContentType; 4] = [
        ContentType::Speech,
        ContentType::Music,
        ContentType::Movie,
        ContentType::Sonification,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContentType::Speech => "SPEECH",
            ContentType::Music => "MUSIC",
            ContentType::Movie => "MOVIE",
            ContentType::Sonification => "SONIFICATION",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.name())
    }
}

impl FromStr for ContentType {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_attribute(s, "content type", Self::PREFIX, &Self::ALL, Self::name, &[])
    }
}

// ============================================================================
// Performance mode
// ============================================================================

/// Tradeoff between power consumption and output latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    None,
    PowerSaving,
    LowLatency,
}

impl PerformanceMode {
    pub const PREFIX: &'static str = "AAUDIO_PERFORMANCE_MODE_";

    pub const ALL: [PerformanceMode; 3] = [
        PerformanceMode::None,
        PerformanceMode::PowerSaving,
        PerformanceMode::LowLatency,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PerformanceMode::None => "NONE",
            PerformanceMode::PowerSaving => "POWER_SAVING",
            PerformanceMode::LowLatency => "LOW_LATENCY",
        }
    }

    pub fn is_low_latency(self) -> bool {
        self == PerformanceMode::LowLatency
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.name())
    }
}

impl FromStr for PerformanceMode {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_attribute(
            s,
            "performance mode",
            Self::PREFIX,
            &Self::ALL,
            Self::name,
            &[],
        )
    }
}

// ============================================================================
// Sharing mode
// ============================================================================

/// Whether the stream demands the output device exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingMode {
    Exclusive,
    Shared,
}

impl SharingMode {
    pub const PREFIX: &'static str = "AAUDIO_SHARING_MODE_";

    pub const ALL: [SharingMode; 2] = [SharingMode::Exclusive, SharingMode::Shared];

    pub fn name(self) -> &'static str {
        match self {
            SharingMode::Exclusive => "EXCLUSIVE",
            SharingMode::Shared => "SHARED",
        }
    }
}

impl fmt::Display for SharingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.name())
    }
}

impl FromStr for SharingMode {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_attribute(s, "sharing mode", Self::PREFIX, &Self::ALL, Self::name, &[])
    }
}

// ============================================================================
// Stream configuration
// ============================================================================

/// Immutable description of how a stream should behave.
///
/// Build with [`StreamConfig::builder`]. There are no setters: a session
/// replaces its configuration wholesale and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamConfig {
    usage: Usage,
    content_type: ContentType,
    performance_mode: PerformanceMode,
    sharing_mode: SharingMode,
    source_path: String,
    description: String,
}

impl StreamConfig {
    /// Start building a configuration for the given source.
    pub fn builder(source_path: impl Into<String>) -> StreamConfigBuilder {
        StreamConfigBuilder {
            inner: StreamConfig {
                source_path: source_path.into(),
                ..Self::default()
            },
        }
    }

    /// Builder seeded with this configuration's values.
    pub fn to_builder(&self) -> StreamConfigBuilder {
        StreamConfigBuilder {
            inner: self.clone(),
        }
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn performance_mode(&self) -> PerformanceMode {
        self.performance_mode
    }

    pub fn sharing_mode(&self) -> SharingMode {
        self.sharing_mode
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Human-readable label. Not behaviorally significant.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            usage: Usage::Media,
            content_type: ContentType::Music,
            performance_mode: PerformanceMode::PowerSaving,
            sharing_mode: SharingMode::Shared,
            source_path: DEFAULT_SOURCE_PATH.to_string(),
            description: "Default Configuration".to_string(),
        }
    }
}

impl fmt::Display for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} / {} / {} / {}]",
            self.description,
            self.usage.name(),
            self.content_type.name(),
            self.performance_mode.name(),
            self.sharing_mode.name()
        )
    }
}

/// Builder for [`StreamConfig`].
#[derive(Debug, Clone)]
pub struct StreamConfigBuilder {
    inner: StreamConfig,
}

impl StreamConfigBuilder {
    pub fn usage(mut self, usage: Usage) -> Self {
        self.inner.usage = usage;
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.inner.content_type = content_type;
        self
    }

    pub fn performance_mode(mut self, mode: PerformanceMode) -> Self {
        self.inner.performance_mode = mode;
        self
    }

    pub fn sharing_mode(mut self, mode: SharingMode) -> Self {
        self.inner.sharing_mode = mode;
        self
    }

    pub fn source_path(mut self, path: impl Into<String>) -> Self {
        self.inner.source_path = path.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.inner.description = description.into();
        self
    }

    pub fn build(self) -> StreamConfig {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_parses_platform_and_short_spellings() {
        assert_eq!("AAUDIO_USAGE_ALARM".parse::<Usage>(), Ok(Usage::Alarm));
        assert_eq!("alarm".parse::<Usage>(), Ok(Usage::Alarm));
        assert_eq!(" Game ".parse::<Usage>(), Ok(Usage::Game));
        assert_eq!(
            "RINGTONE".parse::<Usage>(),
            Ok(Usage::NotificationRingtone)
        );
        assert_eq!(
            "AAUDIO_USAGE_ASSISTANCE_NAVIGATION_GUIDANCE".parse::<Usage>(),
            Ok(Usage::AssistanceNavigationGuidance)
        );
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let err = "AAUDIO_USAGE_KARAOKE".parse::<Usage>().unwrap_err();
        assert_eq!(err.kind, "usage");
        assert_eq!(err.value, "AAUDIO_USAGE_KARAOKE");
        assert!("FAST".parse::<PerformanceMode>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for usage in Usage::ALL {
            assert_eq!(usage.to_string().parse::<Usage>(), Ok(usage));
        }
        for mode in SharingMode::ALL {
            assert_eq!(mode.to_string().parse::<SharingMode>(), Ok(mode));
        }
        assert_eq!(
            ContentType::Movie.to_string(),
            "AAUDIO_CONTENT_TYPE_MOVIE"
        );
        assert_eq!(
            PerformanceMode::LowLatency.to_string(),
            "AAUDIO_PERFORMANCE_MODE_LOW_LATENCY"
        );
    }

    #[test]
    fn test_builder_sets_every_field() {
        let config = StreamConfig::builder("/data/a.wav")
            .usage(Usage::Alarm)
            .content_type(ContentType::Sonification)
            .performance_mode(PerformanceMode::LowLatency)
            .sharing_mode(SharingMode::Exclusive)
            .description("Alarm")
            .build();

        assert_eq!(config.usage(), Usage::Alarm);
        assert_eq!(config.content_type(), ContentType::Sonification);
        assert_eq!(config.performance_mode(), PerformanceMode::LowLatency);
        assert_eq!(config.sharing_mode(), SharingMode::Exclusive);
        assert_eq!(config.source_path(), "/data/a.wav");
        assert_eq!(config.description(), "Alarm");
    }

    #[test]
    fn test_to_builder_leaves_original_untouched() {
        let original = StreamConfig::default();
        let derived = original
            .to_builder()
            .performance_mode(PerformanceMode::LowLatency)
            .build();

        assert_eq!(original.performance_mode(), PerformanceMode::PowerSaving);
        assert_eq!(derived.performance_mode(), PerformanceMode::LowLatency);
        assert_eq!(derived.source_path(), DEFAULT_SOURCE_PATH);
    }

    #[test]
    fn test_communication_usages() {
        assert!(Usage::VoiceCommunication.is_communication());
        assert!(!Usage::Media.is_communication());
    }
}

//! Numeric stream attributes and buffer sizing.
//!
//! The semantic enums in `bridge-traits` map onto the AAudio NDK constants so
//! the desktop engine logs (and sizes buffers) the same way a device build
//! would.

use bridge_traits::{ContentType, PerformanceMode, SharingMode, StreamConfig, Usage};
use hound::{SampleFormat, WavSpec};

pub fn usage_code(usage: Usage) -> i32 {
    match usage {
        Usage::Media => 1,
        Usage::VoiceCommunication => 2,
        Usage::VoiceCommunicationSignalling => 3,
        Usage::Alarm => 4,
        Usage::Notification => 5,
        Usage::NotificationRingtone => 6,
        Usage::NotificationEvent => 10,
        Usage::AssistanceAccessibility => 11,
        Usage::AssistanceNavigationGuidance => 12,
        Usage::AssistanceSonification => 13,
        Usage::Game => 14,
        Usage::Assistant => 16,
    }
}

pub fn content_type_code(content_type: ContentType) -> i32 {
    match content_type {
        ContentType::Speech => 1,
        ContentType::Music => 2,
        ContentType::Movie => 3,
        ContentType::Sonification => 4,
    }
}

pub fn performance_mode_code(mode: PerformanceMode) -> i32 {
    match mode {
        PerformanceMode::None => 10,
        PerformanceMode::PowerSaving => 11,
        PerformanceMode::LowLatency => 12,
    }
}

pub fn sharing_mode_code(mode: SharingMode) -> i32 {
    match mode {
        SharingMode::Exclusive => 0,
        SharingMode::Shared => 1,
    }
}

/// AAudio sample format for a WAV file, or `None` if the engine cannot
/// render it.
///
/// Supported: PCM 16, 24 and 32-bit integer, and 32-bit float.
pub fn sample_format_code(spec: &WavSpec) -> Option<i32> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => Some(1),
        (SampleFormat::Float, 32) => Some(2),
        (SampleFormat::Int, 24) => Some(3),
        (SampleFormat::Int, 32) => Some(4),
        _ => None,
    }
}

/// Stream attributes as the platform sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamAttributes {
    pub usage: i32,
    pub content_type: i32,
    pub performance_mode: i32,
    pub sharing_mode: i32,
}

impl StreamAttributes {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            usage: usage_code(config.usage()),
            content_type: content_type_code(config.content_type()),
            performance_mode: performance_mode_code(config.performance_mode()),
            sharing_mode: sharing_mode_code(config.sharing_mode()),
        }
    }
}

/// Burst length of the simulated output device.
pub const BURST_MILLIS: u32 = 2;

/// Buffer sizing for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPlan {
    pub sample_rate: u32,
    pub frames_per_burst: u32,
    pub capacity_frames: u32,
    pub buffer_frames: u32,
}

impl BufferPlan {
    /// Low latency streams get 40 ms of capacity and two bursts of buffer;
    /// everything else gets 100 ms and four bursts.
    pub fn new(sample_rate: u32, mode: PerformanceMode) -> Self {
        let low_latency = mode.is_low_latency();
        let capacity_millis = if low_latency { 40 } else { 100 };
        let bursts = if low_latency { 2 } else { 4 };

        let frames_per_burst = (sample_rate * BURST_MILLIS / 1000).max(1);
        let capacity_frames = (sample_rate * capacity_millis / 1000).max(1);
        let buffer_frames = (frames_per_burst * bursts).min(capacity_frames);

        Self {
            sample_rate,
            frames_per_burst,
            capacity_frames,
            buffer_frames,
        }
    }

    /// Wall-clock length of one buffer.
    pub fn buffer_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(f64::from(self.buffer_frames) / f64::from(self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_ndk_constants() {
        let config = StreamConfig::builder("/data/a.wav")
            .usage(Usage::AssistanceNavigationGuidance)
            .content_type(ContentType::Speech)
            .performance_mode(PerformanceMode::None)
            .sharing_mode(SharingMode::Exclusive)
            .build();

        assert_eq!(
            StreamAttributes::from_config(&config),
            StreamAttributes {
                usage: 12,
                content_type: 1,
                performance_mode: 10,
                sharing_mode: 0,
            }
        );
        assert_eq!(usage_code(Usage::Assistant), 16);
    }

    #[test]
    fn test_every_usage_has_a_distinct_code() {
        let mut codes: Vec<_> = Usage::ALL.iter().map(|u| usage_code(*u)).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Usage::ALL.len());
    }

    #[test]
    fn test_low_latency_plan() {
        let plan = BufferPlan::new(48_000, PerformanceMode::LowLatency);
        assert_eq!(plan.frames_per_burst, 96);
        assert_eq!(plan.capacity_frames, 1_920);
        assert_eq!(plan.buffer_frames, 192);
    }

    #[test]
    fn test_power_saving_plan() {
        let plan = BufferPlan::new(48_000, PerformanceMode::PowerSaving);
        assert_eq!(plan.capacity_frames, 4_800);
        assert_eq!(plan.buffer_frames, 384);
    }

    #[test]
    fn test_buffer_capped_at_capacity() {
        // Both sizes round to the one-frame minimum at 10 Hz.
        let plan = BufferPlan::new(10, PerformanceMode::LowLatency);
        assert_eq!(plan.capacity_frames, 1);
        assert_eq!(plan.buffer_frames, 1);
    }

    #[test]
    fn test_supported_sample_formats() {
        let spec = |bits, sample_format| WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: bits,
            sample_format,
        };
        assert_eq!(sample_format_code(&spec(16, SampleFormat::Int)), Some(1));
        assert_eq!(sample_format_code(&spec(32, SampleFormat::Float)), Some(2));
        assert_eq!(sample_format_code(&spec(24, SampleFormat::Int)), Some(3));
        assert_eq!(sample_format_code(&spec(8, SampleFormat::Int)), None);
    }
}

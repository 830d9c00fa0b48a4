//! Audio focus arbitration.
//!
//! Audio focus is the platform-mediated right to produce audible output
//! without being overridden by another application. A [`FocusArbiter`]
//! grants or denies focus requests and later tells the holder, through a
//! [`FocusListener`], when that right is taken away.
//!
//! The arbiter has no playback knowledge. It only arbitrates the shared
//! output resource:
//!
//! - **Android**: `AudioManager.requestAudioFocus` / `abandonAudioFocusRequest`
//! - **iOS**: `AVAudioSession` activation and interruption notifications
//! - **Desktop**: in-process arbitration between sessions of one host
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::focus::{FocusArbiter, FocusRequest};
//!
//! let request = FocusRequest::for_config(&config);
//! match arbiter.request_focus(&request, listener)? {
//!     Some(token) => { /* start output, keep token until stop */ }
//!     None => { /* denied, leave the engine untouched */ }
//! }
//! ```

use crate::error::Result;
use crate::playback::{ContentType, StreamConfig, Usage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of focus being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusGain {
    /// Focus for an unknown duration, e.g. music playback.
    Gain,
    /// Short-lived focus; the previous holder is expected to resume afterwards.
    GainTransient,
    /// Short-lived focus during which the previous holder may keep playing
    /// at reduced volume.
    GainTransientMayDuck,
}

impl FocusGain {
    pub fn is_transient(self) -> bool {
        !matches!(self, FocusGain::Gain)
    }
}

/// Focus change delivered asynchronously to the current or former holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusChange {
    Gained,
    LostPermanent,
    LostTransient,
    LostTransientCanDuck,
}

impl FocusChange {
    pub fn is_loss(self) -> bool {
        !matches!(self, FocusChange::Gained)
    }
}

impl fmt::Display for FocusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FocusChange::Gained => "gained",
            FocusChange::LostPermanent => "lost",
            FocusChange::LostTransient => "lost (transient)",
            FocusChange::LostTransientCanDuck => "lost (transient, may duck)",
        };
        f.write_str(label)
    }
}

/// Attributes the arbiter uses to decide a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    pub usage: Usage,
    pub content_type: ContentType,
    pub gain: FocusGain,
    /// Whether the requester accepts a grant that arrives later. Sessions
    /// never do; a request is decided synchronously.
    pub accepts_delayed_gain: bool,
}

impl FocusRequest {
    /// Permanent focus request carrying the stream's attributes.
    pub fn for_config(config: &StreamConfig) -> Self {
        Self {
            usage: config.usage(),
            content_type: config.content_type(),
            gain: FocusGain::Gain,
            accepts_delayed_gain: false,
        }
    }

    pub fn with_gain(mut self, gain: FocusGain) -> Self {
        self.gain = gain;
        self
    }
}

/// Opaque handle representing a granted focus request.
///
/// Not `Clone`: the holder gives it back through
/// [`FocusArbiter::abandon_focus`], so a token cannot be abandoned twice.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FocusToken(u64);

impl FocusToken {
    /// Mint a token. Only arbiter implementations should call this.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Receiver of focus changes. May be invoked from any thread.
pub trait FocusListener: Send + Sync {
    fn on_focus_change(&self, change: FocusChange);
}

/// Arbitrates exclusive or transient use of the shared audio output.
pub trait FocusArbiter: Send + Sync {
    /// Request focus.
    ///
    /// Returns `Ok(Some(token))` when granted and `Ok(None)` when denied. The
    /// decision is synchronous from the caller's point of view. Later changes
    /// are delivered to `listener` until the token is abandoned.
    fn request_focus(
        &self,
        request: &FocusRequest,
        listener: Arc<dyn FocusListener>,
    ) -> Result<Option<FocusToken>>;

    /// Give focus back. Abandoning a token the arbiter no longer tracks is a
    /// no-op.
    fn abandon_focus(&self, token: FocusToken);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PerformanceMode;

    #[test]
    fn test_request_carries_stream_attributes() {
        let config = StreamConfig::builder("/data/alarm.wav")
            .usage(Usage::Alarm)
            .content_type(ContentType::Sonification)
            .performance_mode(PerformanceMode::LowLatency)
            .build();

        let request = FocusRequest::for_config(&config);
        assert_eq!(request.usage, Usage::Alarm);
        assert_eq!(request.content_type, ContentType::Sonification);
        assert_eq!(request.gain, FocusGain::Gain);
        assert!(!request.accepts_delayed_gain);

        let transient = request.with_gain(FocusGain::GainTransientMayDuck);
        assert!(transient.gain.is_transient());
    }

    #[test]
    fn test_focus_change_classification() {
        assert!(!FocusChange::Gained.is_loss());
        assert!(FocusChange::LostPermanent.is_loss());
        assert!(FocusChange::LostTransient.is_loss());
        assert!(FocusChange::LostTransientCanDuck.is_loss());
        assert_eq!(FocusChange::LostTransient.to_string(), "lost (transient)");
    }

    #[test]
    fn test_token_exposes_id() {
        assert_eq!(FocusToken::new(7).id(), 7);
    }
}

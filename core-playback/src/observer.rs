//! Observer contract for asynchronous session outcomes.
//!
//! Notifications are delivered from the session's dispatcher thread, one at a
//! time and never concurrently with each other. The session holds no lock
//! while calling an observer, so an observer may call back into the session
//! (for example to `play` again after `on_playback_stopped`).
//!
//! Marshaling onto a UI thread is the host's job.

use bridge_traits::{FocusChange, StreamConfig};
use core_runtime::events::{CoreEvent, FocusEvent, SessionEvent};

/// Receives the outcome of engine confirmations.
///
/// Synchronous rejections (`AlreadyActive`, `FocusDenied`, ...) are returned
/// to the caller and never reach the observer.
pub trait SessionObserver: Send + Sync {
    fn on_playback_started(&self) {}

    fn on_playback_stopped(&self) {}

    fn on_playback_error(&self, _reason: &str) {}
}

/// Observer that ignores everything. Used when the host only subscribes to
/// the event bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// A notification waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notification {
    Started(StreamConfig),
    Stopped(StreamConfig),
    Error(String),
    /// Published on the event bus only.
    Focus(FocusChange),
}

impl Notification {
    pub(crate) fn deliver(&self, observer: &dyn SessionObserver) {
        match self {
            Notification::Started(_) => observer.on_playback_started(),
            Notification::Stopped(_) => observer.on_playback_stopped(),
            Notification::Error(reason) => observer.on_playback_error(reason),
            Notification::Focus(_) => {}
        }
    }

    pub(crate) fn to_event(&self) -> CoreEvent {
        let event = match self {
            Notification::Focus(change) => {
                return CoreEvent::Focus(FocusEvent::Changed { change: *change })
            }
            Notification::Started(config) => SessionEvent::Started {
                config: config.clone(),
            },
            Notification::Stopped(config) => SessionEvent::Stopped {
                config: config.clone(),
            },
            Notification::Error(reason) => SessionEvent::Error {
                message: reason.clone(),
            },
        };
        CoreEvent::Session(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl SessionObserver for Recorder {
        fn on_playback_started(&self) {
            self.calls.lock().push("started".into());
        }

        fn on_playback_error(&self, reason: &str) {
            self.calls.lock().push(format!("error:{reason}"));
        }
    }

    #[test]
    fn test_deliver_dispatches_to_matching_method() {
        let recorder = Recorder::default();
        Notification::Started(StreamConfig::default()).deliver(&recorder);
        Notification::Stopped(StreamConfig::default()).deliver(&recorder);
        Notification::Error("xrun".into()).deliver(&recorder);
        Notification::Focus(FocusChange::LostTransient).deliver(&recorder);

        assert_eq!(*recorder.calls.lock(), vec!["started", "error:xrun"]);
    }

    #[test]
    fn test_notifications_map_to_session_events() {
        let event = Notification::Error("disconnected".into()).to_event();
        assert_eq!(
            event,
            CoreEvent::Session(SessionEvent::Error {
                message: "disconnected".into()
            })
        );
    }
}

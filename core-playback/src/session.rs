//! # Playback Session Controller
//!
//! Owns one output stream at a time and drives it through the
//! `Idle → Starting → Playing → Stopping → Idle` state machine.
//!
//! ## Concurrency
//!
//! All state lives behind a single `parking_lot::Mutex`. Caller operations
//! (`configure`, `play`, `stop`, `release`) hold it for their whole
//! synchronous part, so at most one transition is in flight and a call that
//! loses a race is rejected outright.
//!
//! Engine callbacks and focus changes never touch the state directly. They are
//! queued on a channel and applied by one dispatcher thread per session:
//!
//! ```text
//!  engine thread ──on_started/on_stopped/on_error──┐
//!                                                  ├──> queue ──> dispatcher ──> observer
//!  focus arbiter ──on_focus_change─────────────────┘        (apply under lock,    + event bus
//!                                                            deliver after unlock)
//! ```
//!
//! Because callbacks only enqueue, an engine that reports synchronously from
//! inside `start`/`stop`, or an arbiter that notifies from inside a request,
//! cannot deadlock the session. The dispatcher is also the single delivery
//! point for observer notifications, and it enforces the start/stop
//! confirmation deadlines from [`CoreConfig`].
//!
//! ## Usage
//!
//! ```ignore
//! let session = PlaybackSession::new(core_config, Arc::new(MyObserver))?;
//! session.configure(catalog.default_config())?;
//! session.play()?;              // returns immediately; Playing is confirmed later
//! // ...
//! session.stop()?;
//! session.release()?;
//! ```

use crate::config::validate_config;
use crate::error::{Result, SessionError};
use crate::observer::{Notification, SessionObserver};
use crate::state::SessionState;

use bridge_traits::{
    EngineHandle, EngineListener, FocusArbiter, FocusChange, FocusListener, FocusRequest,
    FocusToken, NativeEngine, StreamConfig,
};
use core_runtime::{CoreConfig, EventBus, EventStream};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ============================================================================
// Messages
// ============================================================================

enum Message {
    EngineStarted,
    EngineStopped,
    EngineError(String),
    Focus { generation: u64, change: FocusChange },
    /// Notification produced by a caller-thread transition.
    Notify(Notification),
    /// A deadline was armed; recompute the wait.
    Rearm,
    /// Acked with whether the queue was empty behind it.
    Barrier(Sender<bool>),
    Shutdown,
}

/// Engine listener handed to [`NativeEngine::initialize`].
struct EngineCallbacks {
    tx: Sender<Message>,
}

impl EngineListener for EngineCallbacks {
    fn on_started(&self) {
        let _ = self.tx.send(Message::EngineStarted);
    }

    fn on_stopped(&self) {
        let _ = self.tx.send(Message::EngineStopped);
    }

    fn on_error(&self, reason: &str) {
        let _ = self.tx.send(Message::EngineError(reason.to_string()));
    }
}

/// Focus listener registered with one focus request. Changes for an older
/// request carry a stale generation and are dropped.
struct FocusCallbacks {
    generation: u64,
    tx: Sender<Message>,
}

impl FocusListener for FocusCallbacks {
    fn on_focus_change(&self, change: FocusChange) {
        let _ = self.tx.send(Message::Focus {
            generation: self.generation,
            change,
        });
    }
}

// ============================================================================
// Shared state
// ============================================================================

struct Inner {
    state: SessionState,
    config: Option<StreamConfig>,
    focus: Option<FocusToken>,
    focus_generation: u64,
    /// `None` once released.
    engine: Option<EngineHandle>,
    /// The engine may still be running from a cycle the session gave up on.
    engine_dirty: bool,
    owed: OwedCallbacks,
    deadline: Option<Instant>,
}

/// Callbacks an ending engine cycle may still deliver.
///
/// A start that was stopped or timed out before it confirmed may yet report
/// `on_started`. A cycle abandoned on a timeout still owes `on_stopped` or
/// `on_error`. Each is swallowed once so it cannot act on the next cycle.
#[derive(Debug, Default, Clone, Copy)]
struct OwedCallbacks {
    started: bool,
    terminal: bool,
}

fn transition(state: &mut SessionState, next: SessionState) {
    debug!(from = %state, to = %next, "state transition");
    *state = next;
}

impl Inner {
    fn config_snapshot(&self) -> StreamConfig {
        self.config.clone().unwrap_or_default()
    }
}

struct Shared {
    id: Uuid,
    inner: Mutex<Inner>,
    settled: Condvar,
    engine: Arc<dyn NativeEngine>,
    arbiter: Arc<dyn FocusArbiter>,
    observer: Arc<dyn SessionObserver>,
    events: EventBus,
    tx: Sender<Message>,
    start_timeout: Duration,
    stop_timeout: Duration,
}

impl Shared {
    fn abandon_focus(&self, inner: &mut Inner) {
        if let Some(token) = inner.focus.take() {
            debug!(token = token.id(), "abandoning audio focus");
            self.arbiter.abandon_focus(token);
        }
    }

    /// `Starting`/`Playing` → `Stopping`, and ask the engine to stop.
    fn begin_stop(&self, inner: &mut Inner) {
        if matches!(inner.state, SessionState::Starting) {
            inner.owed.started = true;
        }
        transition(&mut inner.state, SessionState::Stopping);
        inner.deadline = Some(Instant::now() + self.stop_timeout);
        if let Some(handle) = inner.engine.as_ref() {
            self.engine.stop(handle);
        }
    }

    /// Return to `Idle` after the engine stopped, releasing focus.
    fn finish_stop(&self, inner: &mut Inner) -> Notification {
        self.abandon_focus(inner);
        inner.deadline = None;
        inner.engine_dirty = false;
        transition(&mut inner.state, SessionState::Idle);
        Notification::Stopped(inner.config_snapshot())
    }

    /// Resolve an engine failure to `Idle`, releasing focus.
    fn fail(&self, inner: &mut Inner, reason: String) -> Notification {
        transition(&mut inner.state, SessionState::Error(reason.clone()));
        self.abandon_focus(inner);
        inner.deadline = None;
        transition(&mut inner.state, SessionState::Idle);
        Notification::Error(reason)
    }

    fn apply(&self, message: Message) -> Vec<Notification> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let mut notes = Vec::new();

        match message {
            Message::EngineStarted if inner.owed.started => {
                inner.owed.started = false;
                debug!(state = %inner.state, "ignoring engine started for a cycle already stopping");
            }
            Message::EngineStopped | Message::EngineError(_) if inner.owed.terminal => {
                inner.owed = OwedCallbacks::default();
                inner.engine_dirty = false;
                debug!(state = %inner.state, "ignoring late engine stop from abandoned cycle");
            }
            Message::EngineStarted => match inner.state {
                SessionState::Starting => {
                    inner.deadline = None;
                    transition(&mut inner.state, SessionState::Playing);
                    info!(session = %self.id, "playback started");
                    notes.push(Notification::Started(inner.config_snapshot()));
                }
                ref other => debug!(state = %other, "ignoring engine started"),
            },
            Message::EngineStopped => match inner.state {
                SessionState::Starting | SessionState::Playing | SessionState::Stopping => {
                    if !matches!(inner.state, SessionState::Stopping) {
                        info!(state = %inner.state, "engine stopped on its own");
                    }
                    notes.push(self.finish_stop(inner));
                    inner.owed.started = false;
                    info!(session = %self.id, "playback stopped");
                }
                ref other => debug!(state = %other, "ignoring engine stopped"),
            },
            Message::EngineError(reason) => {
                warn!(session = %self.id, state = %inner.state, reason = %reason, "engine error");
                notes.push(self.fail(inner, reason));
                inner.owed.started = false;
            }
            Message::Focus { generation, change } => {
                if generation != inner.focus_generation || inner.focus.is_none() {
                    debug!(%change, generation, "ignoring focus change for abandoned request");
                } else {
                    notes.push(Notification::Focus(change));
                    if change.is_loss() {
                        if inner.state.is_stoppable() {
                            info!(session = %self.id, %change, "audio focus lost, stopping");
                            self.begin_stop(inner);
                        }
                    } else {
                        info!(session = %self.id, "audio focus regained");
                    }
                }
            }
            Message::Notify(note) => notes.push(note),
            Message::Rearm | Message::Barrier(_) | Message::Shutdown => {}
        }

        self.settled.notify_all();
        notes
    }

    /// Deadline passed: resolve a stuck `Starting` or `Stopping`.
    fn expire(&self) -> Vec<Notification> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {}
            _ => return Vec::new(),
        }
        inner.deadline = None;

        let note = match inner.state {
            SessionState::Starting => {
                warn!(session = %self.id, timeout = ?self.start_timeout, "engine did not confirm start");
                if let Some(handle) = inner.engine.as_ref() {
                    self.engine.stop(handle);
                }
                inner.engine_dirty = true;
                inner.owed = OwedCallbacks {
                    started: true,
                    terminal: true,
                };
                Some(self.fail(
                    inner,
                    format!("engine did not confirm start within {:?}", self.start_timeout),
                ))
            }
            SessionState::Stopping => {
                warn!(session = %self.id, timeout = ?self.stop_timeout, "engine did not confirm stop, forcing idle");
                let note = self.finish_stop(inner);
                inner.engine_dirty = true;
                inner.owed.terminal = true;
                Some(note)
            }
            _ => None,
        };

        self.settled.notify_all();
        note.into_iter().collect()
    }

    fn deliver(&self, notes: Vec<Notification>) {
        for note in notes {
            note.deliver(self.observer.as_ref());
            // No subscribers is fine.
            let _ = self.events.emit(note.to_event());
        }
    }

    fn run(self: Arc<Self>, rx: Receiver<Message>) {
        debug!(session = %self.id, "dispatcher started");
        loop {
            let deadline = self.inner.lock().deadline;
            let received = match deadline {
                Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            let notes = match received {
                Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(Message::Barrier(ack)) => {
                    let _ = ack.send(rx.is_empty());
                    continue;
                }
                Ok(message) => self.apply(message),
                Err(RecvTimeoutError::Timeout) => self.expire(),
            };

            self.deliver(notes);
        }
        debug!(session = %self.id, "dispatcher stopped");
    }
}

// ============================================================================
// Session
// ============================================================================

/// Controller for a single real-time playback session.
pub struct PlaybackSession {
    shared: Arc<Shared>,
    dispatcher: Option<JoinHandle<()>>,
    dispatcher_id: ThreadId,
}

impl PlaybackSession {
    /// Load the engine, create the engine instance and start the dispatcher.
    ///
    /// # Errors
    ///
    /// Fails if the runtime configuration is invalid or the engine cannot be
    /// loaded or initialized.
    pub fn new(config: CoreConfig, observer: Arc<dyn SessionObserver>) -> Result<Self> {
        config.validate()?;
        config.engine.ensure_loaded()?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = config
            .engine
            .initialize(Arc::new(EngineCallbacks { tx: tx.clone() }))?;

        let id = Uuid::new_v4();
        let shared = Arc::new(Shared {
            id,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                config: None,
                focus: None,
                focus_generation: 0,
                engine: Some(handle),
                engine_dirty: false,
                owed: OwedCallbacks::default(),
                deadline: None,
            }),
            settled: Condvar::new(),
            engine: config.engine,
            arbiter: config.focus_arbiter,
            observer,
            events: EventBus::new(config.event_buffer_size),
            tx,
            start_timeout: config.start_timeout,
            stop_timeout: config.stop_timeout,
        });

        let runner = Arc::clone(&shared);
        let dispatcher = thread::Builder::new()
            .name("playback-session".to_string())
            .spawn(move || runner.run(rx));

        let dispatcher = match dispatcher {
            Ok(dispatcher) => dispatcher,
            Err(err) => {
                if let Some(handle) = shared.inner.lock().engine.take() {
                    shared.engine.release(handle);
                }
                return Err(SessionError::Engine(format!(
                    "failed to spawn session dispatcher: {}",
                    err
                )));
            }
        };

        info!(session = %id, "playback session created");
        Ok(Self {
            shared,
            dispatcher_id: dispatcher.thread().id(),
            dispatcher: Some(dispatcher),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Replace the configuration used by the next `play`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Released`] after `release`
    /// - [`SessionError::InvalidConfiguration`] for a blank or unrecognized source
    /// - [`SessionError::ConfigurationWhilePlaying`] unless idle
    /// - [`SessionError::EngineConfigurationRejected`] if the engine refuses it;
    ///   the previous configuration stays in effect
    #[instrument(skip(self, config), fields(session = %self.shared.id, config = %config))]
    pub fn configure(&self, config: StreamConfig) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;

        let Some(handle) = inner.engine.as_ref() else {
            return Err(SessionError::Released);
        };

        validate_config(&config)?;

        if !inner.state.is_idle() {
            return Err(SessionError::ConfigurationWhilePlaying);
        }

        self.shared
            .engine
            .apply_configuration(handle, &config)
            .map_err(|err| SessionError::EngineConfigurationRejected(err.to_string()))?;

        info!("configuration applied");
        inner.config = Some(config);
        Ok(())
    }

    /// Request focus and ask the engine to start. Returns once the request is
    /// issued; `Playing` is confirmed later through the observer.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Released`] after `release`
    /// - [`SessionError::AlreadyActive`] unless idle
    /// - [`SessionError::InvalidConfiguration`] if nothing was configured
    /// - [`SessionError::FocusDenied`] if the arbiter refuses
    /// - [`SessionError::EngineStartFailed`] if the engine refuses the start
    #[instrument(skip(self), fields(session = %self.shared.id))]
    pub fn play(&self) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;

        let Some(handle) = inner.engine.as_ref() else {
            return Err(SessionError::Released);
        };

        if !inner.state.is_idle() {
            return Err(SessionError::AlreadyActive);
        }

        let Some(config) = inner.config.as_ref() else {
            return Err(SessionError::InvalidConfiguration(
                "no configuration applied".to_string(),
            ));
        };

        if inner.engine_dirty {
            debug!("stopping engine left over from an earlier cycle");
            self.shared.engine.stop(handle);
            inner.engine_dirty = false;
        }

        inner.focus_generation += 1;
        let listener = Arc::new(FocusCallbacks {
            generation: inner.focus_generation,
            tx: self.shared.tx.clone(),
        });
        let request = FocusRequest::for_config(config);

        let token = match self.shared.arbiter.request_focus(&request, listener)? {
            Some(token) => token,
            None => {
                info!(usage = %request.usage, "audio focus denied");
                return Err(SessionError::FocusDenied);
            }
        };
        debug!(token = token.id(), "audio focus granted");
        inner.focus = Some(token);

        transition(&mut inner.state, SessionState::Starting);
        inner.deadline = Some(Instant::now() + self.shared.start_timeout);

        if let Err(err) = self.shared.engine.start(handle) {
            let reason = err.to_string();
            warn!(reason = %reason, "engine refused to start");
            let note = self.shared.fail(inner, reason.clone());
            let _ = self.shared.tx.send(Message::Notify(note));
            return Err(SessionError::EngineStartFailed(reason));
        }

        let _ = self.shared.tx.send(Message::Rearm);
        Ok(())
    }

    /// Ask the engine to stop. Accepted while starting or playing; returns
    /// once the request is issued.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Released`] after `release`
    /// - [`SessionError::NotPlaying`] unless starting or playing
    #[instrument(skip(self), fields(session = %self.shared.id))]
    pub fn stop(&self) -> Result<()> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;

        if inner.engine.is_none() {
            return Err(SessionError::Released);
        }

        if !inner.state.is_stoppable() {
            return Err(SessionError::NotPlaying);
        }

        self.shared.begin_stop(inner);
        let _ = self.shared.tx.send(Message::Rearm);
        Ok(())
    }

    /// Only the confirmed steady state counts as playing.
    pub fn is_playing(&self) -> bool {
        matches!(self.shared.inner.lock().state, SessionState::Playing)
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state.clone()
    }

    pub fn current_config(&self) -> Option<StreamConfig> {
        self.shared.inner.lock().config.clone()
    }

    pub fn is_released(&self) -> bool {
        self.shared.inner.lock().engine.is_none()
    }

    /// Stop if needed, wait up to the stop timeout for the engine to confirm,
    /// then destroy the engine instance. A second call does nothing.
    #[instrument(skip(self), fields(session = %self.shared.id))]
    pub fn release(&self) -> Result<()> {
        let mut guard = self.shared.inner.lock();

        if guard.engine.is_none() {
            return Ok(());
        }

        if guard.state.is_stoppable() {
            self.shared.begin_stop(&mut guard);
        }

        // The dispatcher cannot confirm a stop while it is running this call.
        if thread::current().id() != self.dispatcher_id {
            let deadline = Instant::now() + self.shared.stop_timeout;
            while guard.state.is_active() {
                if self.shared.settled.wait_until(&mut guard, deadline).timed_out() {
                    break;
                }
            }
        }

        let inner = &mut *guard;
        if inner.state.is_active() {
            warn!(state = %inner.state, "engine did not confirm stop before release, forcing idle");
            let note = self.shared.finish_stop(inner);
            let _ = self.shared.tx.send(Message::Notify(note));
        }

        if let Some(handle) = inner.engine.take() {
            self.shared.engine.release(handle);
        }
        info!("playback session released");
        Ok(())
    }

    /// Block until every callback and notification queued before this call
    /// has been applied and delivered. Does not wait for the engine.
    ///
    /// Returns immediately when called from an observer callback.
    pub fn settle(&self) {
        if thread::current().id() == self.dispatcher_id {
            return;
        }

        // Observers may queue more work while their notifications are
        // delivered, so repeat until nothing is left behind the barrier.
        loop {
            let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
            if self.shared.tx.send(Message::Barrier(ack_tx)).is_err() {
                return;
            }
            match ack_rx.recv() {
                Ok(false) => continue,
                Ok(true) | Err(_) => return,
            }
        }
    }

    /// Subscribe to session and focus events.
    pub fn subscribe(&self) -> EventStream {
        self.shared.events.stream()
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        let _ = self.release();
        let _ = self.shared.tx.send(Message::Shutdown);
        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.thread().id() != thread::current().id() {
                let _ = dispatcher.join();
            }
        }
    }
}

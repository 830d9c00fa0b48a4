//! WAV-backed engine.
//!
//! Each engine instance renders on its own stream thread, the way a native
//! real-time callback runs outside the caller's control. Completion and
//! failures come back only through the [`EngineListener`].

use crate::attributes::{sample_format_code, BufferPlan, StreamAttributes};
use bridge_traits::{
    BridgeError, EngineHandle, EngineListener, NativeEngine, PerformanceMode, Result, StreamConfig,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use hound::{SampleFormat, WavReader};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Process-wide backend, loaded once.
#[derive(Debug)]
struct Backend {
    default_sample_rate: u32,
}

static BACKEND: OnceLock<Backend> = OnceLock::new();

fn backend() -> Result<&'static Backend> {
    BACKEND
        .get()
        .ok_or_else(|| BridgeError::NotAvailable("audio backend not loaded".to_string()))
}

#[derive(Debug, Clone)]
struct PreparedStream {
    source: PathBuf,
    attributes: StreamAttributes,
    performance_mode: PerformanceMode,
    plan: BufferPlan,
}

struct StreamWorker {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl StreamWorker {
    fn request_stop(&self) {
        // A full slot means a stop is already pending.
        let _ = self.stop_tx.try_send(());
    }

    fn join(self) {
        self.request_stop();
        if self.thread.join().is_err() {
            warn!("stream thread panicked");
        }
    }
}

struct Instance {
    listener: Arc<dyn EngineListener>,
    stream: Option<PreparedStream>,
    worker: Option<StreamWorker>,
}

/// [`NativeEngine`] that plays WAV files on a background thread.
///
/// Output is simulated: samples are decoded with `hound` and paced in
/// buffer-sized steps, so a file "plays" for its real duration. Use
/// [`WavEngine::unpaced`] to render as fast as decoding allows.
pub struct WavEngine {
    instances: Mutex<HashMap<u64, Instance>>,
    next_id: AtomicU64,
    paced: bool,
}

impl WavEngine {
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            paced: true,
        }
    }

    pub fn unpaced() -> Self {
        let mut engine = Self::new();
        engine.paced = false;
        engine
    }

    fn unknown_handle(handle: &EngineHandle) -> BridgeError {
        BridgeError::InvalidState(format!("engine handle {} is not live", handle.id()))
    }
}

impl Default for WavEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for WavEngine {
    fn ensure_loaded(&self) -> Result<()> {
        BACKEND.get_or_init(|| {
            info!("desktop audio backend loaded");
            Backend {
                default_sample_rate: 48_000,
            }
        });
        Ok(())
    }

    fn initialize(&self, listener: Arc<dyn EngineListener>) -> Result<EngineHandle> {
        backend()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.instances.lock().insert(
            id,
            Instance {
                listener,
                stream: None,
                worker: None,
            },
        );
        debug!(handle = id, "engine instance created");
        Ok(EngineHandle::new(id))
    }

    fn apply_configuration(&self, handle: &EngineHandle, config: &StreamConfig) -> Result<()> {
        let backend = backend()?;
        let mut instances = self.instances.lock();
        let instance = instances
            .get_mut(&handle.id())
            .ok_or_else(|| Self::unknown_handle(handle))?;

        let prepared = PreparedStream {
            source: PathBuf::from(config.source_path()),
            attributes: StreamAttributes::from_config(config),
            performance_mode: config.performance_mode(),
            plan: BufferPlan::new(backend.default_sample_rate, config.performance_mode()),
        };
        info!(
            handle = handle.id(),
            usage = prepared.attributes.usage,
            content_type = prepared.attributes.content_type,
            performance_mode = prepared.attributes.performance_mode,
            sharing_mode = prepared.attributes.sharing_mode,
            capacity_frames = prepared.plan.capacity_frames,
            buffer_frames = prepared.plan.buffer_frames,
            "stream configured"
        );
        instance.stream = Some(prepared);
        Ok(())
    }

    fn start(&self, handle: &EngineHandle) -> Result<()> {
        let mut instances = self.instances.lock();
        let instance = instances
            .get_mut(&handle.id())
            .ok_or_else(|| Self::unknown_handle(handle))?;

        let stream = instance
            .stream
            .clone()
            .ok_or_else(|| BridgeError::InvalidState("no configuration applied".to_string()))?;

        // One stream per instance.
        if let Some(previous) = instance.worker.take() {
            previous.join();
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let listener = Arc::clone(&instance.listener);
        let paced = self.paced;
        let thread = thread::Builder::new()
            .name("wav-engine-stream".to_string())
            .spawn(move || run_stream(stream, listener, stop_rx, paced))
            .map_err(|err| BridgeError::OperationFailed(format!("cannot spawn stream thread: {}", err)))?;

        instance.worker = Some(StreamWorker { stop_tx, thread });
        debug!(handle = handle.id(), "stream start requested");
        Ok(())
    }

    fn stop(&self, handle: &EngineHandle) {
        if let Some(worker) = self
            .instances
            .lock()
            .get(&handle.id())
            .and_then(|instance| instance.worker.as_ref())
        {
            debug!(handle = handle.id(), "stream stop requested");
            worker.request_stop();
        }
    }

    fn release(&self, handle: EngineHandle) {
        let removed = self.instances.lock().remove(&handle.id());
        match removed {
            Some(instance) => {
                if let Some(worker) = instance.worker {
                    worker.join();
                }
                debug!(handle = handle.id(), "engine instance released");
            }
            None => debug!(handle = handle.id(), "release of unknown engine handle"),
        }
    }
}

impl Drop for WavEngine {
    fn drop(&mut self) {
        for (_, instance) in self.instances.get_mut().drain() {
            if let Some(worker) = instance.worker {
                worker.join();
            }
        }
    }
}

// ============================================================================
// Stream thread
// ============================================================================

enum Rendered {
    EndOfStream,
    Interrupted,
}

fn stop_requested(stop_rx: &Receiver<()>, wait: Option<Duration>) -> bool {
    match wait {
        Some(wait) => !matches!(stop_rx.recv_timeout(wait), Err(RecvTimeoutError::Timeout)),
        None => !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)),
    }
}

fn render<S>(
    samples: impl Iterator<Item = hound::Result<S>>,
    samples_per_buffer: usize,
    wait: Option<Duration>,
    stop_rx: &Receiver<()>,
) -> hound::Result<(Rendered, u64)> {
    let mut samples = samples;
    let mut rendered = 0u64;
    loop {
        let mut read = 0;
        for sample in samples.by_ref().take(samples_per_buffer) {
            sample?;
            read += 1;
        }
        if read == 0 {
            return Ok((Rendered::EndOfStream, rendered));
        }
        rendered += read as u64;

        if stop_requested(stop_rx, wait) {
            return Ok((Rendered::Interrupted, rendered));
        }
        if read < samples_per_buffer {
            return Ok((Rendered::EndOfStream, rendered));
        }
    }
}

fn run_stream(
    stream: PreparedStream,
    listener: Arc<dyn EngineListener>,
    stop_rx: Receiver<()>,
    paced: bool,
) {
    let mut reader = match WavReader::open(&stream.source) {
        Ok(reader) => reader,
        Err(err) => {
            warn!(error = %err, "cannot open audio source");
            listener.on_error(&format!("cannot open {}: {}", stream.source.display(), err));
            return;
        }
    };

    let spec = reader.spec();
    let Some(format) = sample_format_code(&spec) else {
        listener.on_error(&format!(
            "unsupported sample format: {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        ));
        return;
    };

    let plan = if spec.sample_rate == stream.plan.sample_rate {
        stream.plan
    } else {
        BufferPlan::new(spec.sample_rate, stream.performance_mode)
    };

    // Stop arrived before the stream came up.
    if stop_requested(&stop_rx, None) {
        listener.on_stopped();
        return;
    }

    info!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        format,
        buffer_frames = plan.buffer_frames,
        "stream started"
    );
    listener.on_started();

    let samples_per_buffer = (plan.buffer_frames as usize * usize::from(spec.channels)).max(1);
    let wait = paced.then(|| plan.buffer_duration());
    let outcome = match spec.sample_format {
        SampleFormat::Float => render(reader.samples::<f32>(), samples_per_buffer, wait, &stop_rx),
        SampleFormat::Int => render(reader.samples::<i32>(), samples_per_buffer, wait, &stop_rx),
    };

    match outcome {
        Ok((rendered, samples)) => {
            let frames = samples / u64::from(spec.channels.max(1));
            match rendered {
                Rendered::EndOfStream => info!(frames, "stream reached end of file"),
                Rendered::Interrupted => info!(frames, "stream stopped"),
            }
            listener.on_stopped();
        }
        Err(err) => {
            warn!(error = %err, "stream decode failed");
            listener.on_error(&format!("decode failed: {}", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::path::Path;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, PartialEq)]
    enum Event {
        Started,
        Stopped,
        Error(String),
    }

    struct ChannelListener(Sender<Event>);

    impl EngineListener for ChannelListener {
        fn on_started(&self) {
            let _ = self.0.send(Event::Started);
        }
        fn on_stopped(&self) {
            let _ = self.0.send(Event::Stopped);
        }
        fn on_error(&self, reason: &str) {
            let _ = self.0.send(Event::Error(reason.to_string()));
        }
    }

    fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for _ in 0..frames * 2 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn setup(engine: &WavEngine) -> (EngineHandle, Receiver<Event>) {
        engine.ensure_loaded().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = engine.initialize(Arc::new(ChannelListener(tx))).unwrap();
        (handle, rx)
    }

    fn config(path: &Path) -> StreamConfig {
        StreamConfig::builder(path.to_string_lossy()).build()
    }

    #[test]
    fn test_plays_file_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, 8_000, 800);

        let engine = WavEngine::unpaced();
        let (handle, rx) = setup(&engine);
        engine.apply_configuration(&handle, &config(&path)).unwrap();
        engine.start(&handle).unwrap();

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Event::Started);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Event::Stopped);
        engine.release(handle);
    }

    #[test]
    fn test_stop_interrupts_paced_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.wav");
        // Ten seconds of audio.
        write_wav(&path, 8_000, 80_000);

        let engine = WavEngine::new();
        let (handle, rx) = setup(&engine);
        engine.apply_configuration(&handle, &config(&path)).unwrap();
        engine.start(&handle).unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Event::Started);

        engine.stop(&handle);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Event::Stopped);
        engine.release(handle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_file_reports_error() {
        let dir = TempDir::new().unwrap();
        let engine = WavEngine::unpaced();
        let (handle, rx) = setup(&engine);
        engine
            .apply_configuration(&handle, &config(&dir.path().join("absent.wav")))
            .unwrap();

        // Accepted; the failure arrives asynchronously.
        engine.start(&handle).unwrap();
        assert!(matches!(rx.recv_timeout(WAIT).unwrap(), Event::Error(reason) if reason.contains("cannot open")));
        engine.release(handle);
    }

    #[test]
    fn test_unsupported_format_reports_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("8bit.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i8).unwrap();
        writer.finalize().unwrap();

        let engine = WavEngine::unpaced();
        let (handle, rx) = setup(&engine);
        engine.apply_configuration(&handle, &config(&path)).unwrap();
        engine.start(&handle).unwrap();

        assert!(matches!(rx.recv_timeout(WAIT).unwrap(), Event::Error(reason) if reason.contains("unsupported")));
        engine.release(handle);
    }

    #[test]
    fn test_start_requires_configuration() {
        let engine = WavEngine::unpaced();
        let (handle, _rx) = setup(&engine);
        assert!(matches!(engine.start(&handle), Err(BridgeError::InvalidState(_))));
        engine.release(handle);
    }

    #[test]
    fn test_stop_without_stream_is_silent() {
        let engine = WavEngine::unpaced();
        let (handle, rx) = setup(&engine);
        engine.stop(&handle);
        engine.release(handle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_released_handle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, 8_000, 80);

        let engine = WavEngine::unpaced();
        let (handle, _rx) = setup(&engine);
        let stale = EngineHandle::new(handle.id());
        engine.release(handle);

        assert!(matches!(
            engine.apply_configuration(&stale, &config(&path)),
            Err(BridgeError::InvalidState(_))
        ));
        assert!(matches!(engine.start(&stale), Err(BridgeError::InvalidState(_))));
        engine.stop(&stale);
        engine.release(stale);
    }
}

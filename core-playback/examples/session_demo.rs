//! # Playback Session Example
//!
//! Plays a WAV file through the desktop engine and prints the session's
//! notifications.
//!
//! Run with:
//! ```bash
//! cargo run --example session_demo --package core-playback -- path/to/file.wav
//!
//! # JSON logs
//! cargo run --example session_demo --package core-playback -- path/to/file.wav json
//! ```

use bridge_desktop::{LocalFocusArbiter, WavEngine};
use bridge_traits::LogLevel;
use core_playback::{ConfigCatalog, ConfigSources, PlaybackSession, SessionObserver};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::CoreConfig;
use crossbeam_channel::Sender;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

struct PrintingObserver {
    done: Sender<()>,
}

impl SessionObserver for PrintingObserver {
    fn on_playback_started(&self) {
        println!("▶ playback started");
    }

    fn on_playback_stopped(&self) {
        println!("■ playback stopped");
        let _ = self.done.send(());
    }

    fn on_playback_error(&self, reason: &str) {
        println!("✗ playback failed: {}", reason);
        let _ = self.done.send(());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(2).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )?;

    let core = CoreConfig::builder()
        .engine(Arc::new(WavEngine::new()))
        .focus_arbiter(Arc::new(LocalFocusArbiter::new()))
        .build()?;

    let catalog = ConfigCatalog::load(ConfigSources::from_core_config(&core));
    println!("Configurations ({}):", catalog.origin());
    for (index, config) in catalog.configs().iter().enumerate() {
        println!("  [{}] {}", index, config);
    }

    let mut config = catalog.default_config();
    if let Some(path) = args.get(1) {
        config = config.to_builder().source_path(path.as_str()).build();
    }

    let (done_tx, done_rx) = crossbeam_channel::bounded(2);
    let session = PlaybackSession::new(core, Arc::new(PrintingObserver { done: done_tx }))?;
    session.configure(config)?;
    session.play()?;
    info!("waiting for playback to finish");

    // Stop after ten seconds if the file is longer.
    if done_rx.recv_timeout(Duration::from_secs(10)).is_err() {
        session.stop()?;
        let _ = done_rx.recv_timeout(Duration::from_secs(2));
    }

    session.release()?;
    Ok(())
}

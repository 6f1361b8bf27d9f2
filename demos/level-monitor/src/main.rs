use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use clap::Parser;

use voice_level_core::{CaptureConfig, CaptureError, CaptureSession, DeviceErrorKind, LevelObserver, SessionState};
use voice_level_cpal::{list_input_devices, CpalInputDevice};

#[derive(Debug, Parser)]
#[command(about = "Microphone level monitor", version)]
struct Cli {
    /// JSON capture config; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input device name (see --list)
    #[arg(long)]
    device: Option<String>,

    /// Override the sample rate (Hz)
    #[arg(long)]
    rate: Option<u32>,

    /// Override the block size (samples)
    #[arg(long)]
    block: Option<usize>,

    /// List input devices and exit
    #[arg(long, default_value_t = false)]
    list: bool,
}

/// Prints each level as a bar; errors end the run.
struct ConsoleObserver {
    done: mpsc::SyncSender<()>,
}

impl LevelObserver for ConsoleObserver {
    fn on_level(&self, decibel: i32) {
        let width = (decibel + 60).clamp(0, 60) as usize;
        println!("{:>5} dB |{:<60}|", decibel, "#".repeat(width));
    }

    fn on_error(&self, kind: DeviceErrorKind) {
        eprintln!("capture error (code {}): {:?}", kind.code(), kind);
    }

    fn on_state_changed(&self, state: SessionState) {
        log::debug!("session {}", state.label());
        if state.is_idle() {
            let _ = self.done.try_send(());
        }
    }
}

fn load_config(cli: &Cli) -> Result<CaptureConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&text).map_err(|e| format!("failed to parse {}: {}", path.display(), e))?
        }
        None => CaptureConfig::default(),
    };
    if let Some(rate) = cli.rate {
        config.sample_rate_hz = rate;
    }
    if let Some(block) = cli.block {
        config.block_size_samples = block;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), String> {
    if cli.list {
        for device in list_input_devices().map_err(|e| e.to_string())? {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}{}", device.name, marker);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let device = match &cli.device {
        Some(name) => CpalInputDevice::with_name(name),
        None => CpalInputDevice::default_device(),
    }
    .map_err(|e| e.to_string())?;

    // Ctrl+C and the session ending on its own both wake the main thread.
    let (done_tx, done_rx) = mpsc::sync_channel(2);
    let interrupt = done_tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.try_send(());
    })
    .map_err(|e| format!("failed to install Ctrl+C handler: {e}"))?;

    let mut session = CaptureSession::new(device);
    log::info!("Using input device '{}'", session.device().name());
    let observer = Arc::new(ConsoleObserver { done: done_tx });
    session.start_with_config(config, observer).map_err(|e| match e {
        CaptureError::PermissionDenied => "microphone permission denied".to_string(),
        other => other.to_string(),
    })?;

    let _ = done_rx.recv();
    session.stop();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("level-monitor: {message}");
            ExitCode::FAILURE
        }
    }
}

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::config::CaptureConfig;
use crate::models::device::StreamSpec;
use crate::models::error::{CaptureError, DeviceErrorKind};
use crate::models::state::SessionState;
use crate::processing::decibel;
use crate::processing::double_buffer::DoubleBuffer;
use crate::processing::pacing::Pacer;
use crate::processing::sequence_guard::SequenceGuard;
use crate::traits::input_device::{DeviceHandle, InputDevice};
use crate::traits::level_observer::LevelObserver;

use super::control::Control;

const CAPTURE_THREAD_NAME: &str = "voice-level-capture";

/// Microphone level meter session.
///
/// Owns one input device and, while active, one capture thread:
/// ```text
/// [DeviceHandle::read] → [DoubleBuffer] → block complete → [SequenceGuard]
///                                                  ↓
///                        pace wait ← [LevelObserver::on_level] ← decibel::estimate
/// ```
///
/// `start` returns as soon as the thread is launched. `stop` blocks until the
/// thread has exited and the device handle is released.
pub struct CaptureSession<D: InputDevice> {
    device: D,
    control: Arc<Control>,
    config: Option<CaptureConfig>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<D: InputDevice> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            control: Arc::new(Control::new()),
            config: None,
            worker: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.control.state()
    }

    /// Configuration of the current or most recent run.
    pub fn config(&self) -> Option<&CaptureConfig> {
        self.config.as_ref()
    }

    /// Blocks delivered to the observer during the current or most recent run.
    pub fn blocks_delivered(&self) -> u64 {
        self.control.delivered()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Start with the default 8 kHz rate and 6000-sample blocks.
    pub fn start(&mut self, observer: Arc<dyn LevelObserver>) -> Result<(), CaptureError> {
        self.start_with_config(CaptureConfig::default(), observer)
    }

    pub fn start_with_rate(
        &mut self,
        sample_rate_hz: u32,
        block_size_samples: usize,
        observer: Arc<dyn LevelObserver>,
    ) -> Result<(), CaptureError> {
        self.start_with_config(CaptureConfig::new(sample_rate_hz, block_size_samples), observer)
    }

    /// Acquire the device and launch the capture thread. Transitions: idle → starting.
    pub fn start_with_config(
        &mut self,
        config: CaptureConfig,
        observer: Arc<dyn LevelObserver>,
    ) -> Result<(), CaptureError> {
        if self.control.state().is_active() {
            return Err(CaptureError::AlreadyRunning);
        }
        config.validate().map_err(CaptureError::InvalidConfiguration)?;

        // A previous run may have ended on its own; collect its thread.
        self.join_worker();

        self.control.begin()?;
        if let Err(e) = self.launch(&config, observer) {
            self.control.finish();
            return Err(e);
        }
        self.config = Some(config);
        Ok(())
    }

    fn launch(&mut self, config: &CaptureConfig, observer: Arc<dyn LevelObserver>) -> Result<(), CaptureError> {
        if !self.device.has_permission() {
            log::warn!("Microphone permission not granted");
            return Err(CaptureError::PermissionDenied);
        }

        let minimum = self.device.minimum_buffer_size(config.sample_rate_hz)?;
        let buffer_size = config.device_buffer_size(minimum);
        let spec = StreamSpec::mono_i16(config.sample_rate_hz, buffer_size, config.queue_capacity(buffer_size));
        let handle = self.device.open(&spec)?;

        log::info!(
            "Starting capture: {} Hz, {} samples/block, pace {} ms, device buffer {} samples",
            config.sample_rate_hz,
            config.block_size_samples,
            config.pace_interval_ms(),
            spec.buffer_size_samples
        );

        // The teardown guard travels with the closure, so a failed spawn still
        // releases the handle when the closure is dropped.
        let device = Teardown::new(handle, Arc::clone(&self.control));
        let control = Arc::clone(&self.control);
        let thread_config = config.clone();

        let worker = thread::Builder::new()
            .name(CAPTURE_THREAD_NAME.into())
            .spawn(move || capture_thread(device, thread_config, control, observer))
            .map_err(|e| CaptureError::ThreadSpawnFailed(e.to_string()))?;

        self.worker = Some(worker);
        Ok(())
    }

    /// Stop capture and wait for the capture thread to exit.
    ///
    /// Idempotent; safe to call before `start` and after the loop ended on its own.
    pub fn stop(&mut self) {
        if self.control.request_stop() {
            log::info!("Stopping capture session");
        }
        self.join_worker();
        self.control.finish();
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
    }
}

impl<D: InputDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the device handle on the capture thread and tears it down exactly once.
///
/// Runs on every exit path, including a panicking observer: stops streaming
/// if the device is recording, releases it, then returns the session to idle.
struct Teardown<H: DeviceHandle> {
    handle: H,
    control: Arc<Control>,
}

impl<H: DeviceHandle> Teardown<H> {
    fn new(handle: H, control: Arc<Control>) -> Self {
        Self { handle, control }
    }
}

impl<H: DeviceHandle> Drop for Teardown<H> {
    fn drop(&mut self) {
        if self.handle.state().is_recording() {
            self.handle.stop_streaming();
            log::debug!("Input streaming stopped");
        }
        self.handle.release();
        log::debug!("Input device released");
        self.control.finish();
    }
}

enum Readiness {
    Ready,
    TimedOut,
    Cancelled,
}

fn capture_thread<H: DeviceHandle>(
    mut device: Teardown<H>,
    config: CaptureConfig,
    control: Arc<Control>,
    observer: Arc<dyn LevelObserver>,
) {
    observer.on_state_changed(SessionState::Starting);

    match wait_until_ready(&device.handle, &config, &control) {
        Readiness::Ready => capture_blocks(&mut device.handle, &config, &control, observer.as_ref()),
        Readiness::TimedOut => {
            log::error!(
                "Input device not ready after {} ms",
                config.readiness_budget_ms
            );
            observer.on_error(DeviceErrorKind::InitFailed);
        }
        Readiness::Cancelled => log::debug!("Stop requested before device became ready"),
    }

    control.enter_stopping();
    observer.on_state_changed(SessionState::Stopping);
    drop(device);
    observer.on_state_changed(SessionState::Idle);
}

/// Poll readiness in `readiness_step` increments up to `readiness_budget`.
fn wait_until_ready<H: DeviceHandle>(handle: &H, config: &CaptureConfig, control: &Control) -> Readiness {
    let budget = config.readiness_budget();
    let step = config.readiness_step();
    let mut waited = Duration::ZERO;

    while !handle.state().is_ready() && waited < budget {
        if !control.wait_while_running(step) {
            return Readiness::Cancelled;
        }
        waited += step;
    }

    if handle.state().is_ready() {
        Readiness::Ready
    } else {
        Readiness::TimedOut
    }
}

fn capture_blocks<H: DeviceHandle>(
    handle: &mut H,
    config: &CaptureConfig,
    control: &Control,
    observer: &dyn LevelObserver,
) {
    if let Err(e) = handle.start_streaming() {
        log::error!("Failed to start input streaming: {}", e);
        observer.on_error(DeviceErrorKind::InitFailed);
        return;
    }
    if !control.mark_running() {
        return;
    }
    observer.on_state_changed(SessionState::Running);

    let mut buffer = DoubleBuffer::new(config.block_size_samples);
    let mut sequence = SequenceGuard::new();
    let pacer = Pacer::new(config.pace_interval(), config.pace_floor());

    while control.is_running() {
        let started = Instant::now();
        let read = handle.read(buffer.spare_mut());

        if !control.is_running() {
            break;
        }

        let count = match read {
            Ok(count) => count,
            Err(e) => {
                log::error!("Input read failed: {}", e);
                observer.on_error(DeviceErrorKind::ReadFailed);
                break;
            }
        };

        if !buffer.commit(count) {
            continue;
        }
        sequence.produce();

        if let (Some(seq), Some(block)) = (sequence.claim(), buffer.completed_block()) {
            let level = decibel::estimate(block);
            control.record_delivery(seq);
            log::debug!("Block {}: {} dB", seq, level);
            observer.on_level(level);
        }

        // Reads come in bursts; hold back so deliveries track real time.
        if !control.wait_while_running(pacer.delay_since(started)) {
            break;
        }
    }
}

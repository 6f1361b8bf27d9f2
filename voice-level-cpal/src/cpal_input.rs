//! cpal microphone input.
//!
//! cpal pushes buffers from its own audio thread. The data callback
//! converts them to mono `i16` in a reused scratch buffer and pushes them
//! into a lock-free SPSC queue sized from `StreamSpec::queue_capacity_samples`;
//! `read` drains it on the capture thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedBufferSize, SupportedStreamConfig};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;

use voice_level_core::models::device::{DeviceState, StreamSpec};
use voice_level_core::{CaptureError, DeviceHandle, InputDevice};

use crate::error::BackendError;

/// Longest a single `read` waits for samples before returning a short read.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Sleep between polls of an empty queue.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

type SampleProducer = ringbuf::HeapProd<i16>;
type SampleConsumer = ringbuf::HeapCons<i16>;

/// cpal-backed input device.
pub struct CpalInputDevice {
    device: cpal::Device,
    name: String,
}

impl CpalInputDevice {
    /// The host's default input device.
    pub fn default_device() -> Result<Self, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))?;
        Ok(Self::from_device(device))
    }

    /// An input device by its cpal name.
    pub fn with_name(name: &str) -> Result<Self, CaptureError> {
        let mut devices = cpal::default_host()
            .input_devices()
            .map_err(BackendError::from)?;
        let device = devices
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceUnavailable(format!("input device '{name}' not found")))?;
        Ok(Self::from_device(device))
    }

    fn from_device(device: cpal::Device) -> Self {
        let name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
        Self { device, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pick a supported config covering `sample_rate_hz`, preferring fewer
    /// channels and native 16-bit samples.
    fn select_config(&self, sample_rate_hz: u32) -> Result<SupportedStreamConfig, CaptureError> {
        let rate = cpal::SampleRate(sample_rate_hz);
        self.device
            .supported_input_configs()
            .map_err(BackendError::from)?
            .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .filter_map(|range| format_rank(range.sample_format()).map(|rank| (range, rank)))
            .min_by_key(|(range, rank)| (range.channels(), *rank))
            .map(|(range, _)| range.with_sample_rate(rate))
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable(format!(
                    "'{}' cannot capture at {} Hz",
                    self.name, sample_rate_hz
                ))
            })
    }
}

impl InputDevice for CpalInputDevice {
    type Handle = CpalStreamHandle;

    fn minimum_buffer_size(&self, sample_rate_hz: u32) -> Result<usize, CaptureError> {
        let config = self.select_config(sample_rate_hz)?;
        let fallback = (sample_rate_hz / 10).max(1) as usize;
        Ok(match config.buffer_size() {
            SupportedBufferSize::Range { min, .. } if *min > 0 => *min as usize,
            _ => fallback,
        })
    }

    fn open(&self, spec: &StreamSpec) -> Result<CpalStreamHandle, CaptureError> {
        let config = self.select_config(spec.sample_rate_hz)?;
        log::info!(
            "Opened '{}': {} Hz, {} ch, {:?}, buffer {} samples, queue {} samples",
            self.name,
            spec.sample_rate_hz,
            config.channels(),
            config.sample_format(),
            spec.buffer_size_samples,
            spec.queue_capacity_samples
        );
        Ok(CpalStreamHandle::new(self.device.clone(), config, spec.queue_capacity_samples))
    }
}

/// State the cpal callbacks share with the handle.
#[derive(Default)]
struct Shared {
    /// Samples lost because the queue was full.
    dropped: AtomicU64,
    /// Set by the stream error callback, which runs off the data path.
    failure: Mutex<Option<String>>,
}

/// Lock-free queue between the data callback and `read`.
fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    HeapRb::<i16>::new(capacity.max(1)).split()
}

/// Push converted samples; anything that does not fit is counted as dropped.
fn deliver(producer: &mut SampleProducer, samples: &[i16], shared: &Shared) {
    let written = producer.push_slice(samples);
    if written < samples.len() {
        shared.dropped.fetch_add((samples.len() - written) as u64, Ordering::Relaxed);
    }
}

/// Opened cpal input.
///
/// The `cpal::Stream` is built in `start_streaming`, so it lives entirely on
/// the capture thread that owns this handle.
pub struct CpalStreamHandle {
    device: cpal::Device,
    config: SupportedStreamConfig,
    queue_capacity: usize,
    shared: Arc<Shared>,
    consumer: Option<SampleConsumer>,
    stream: Option<cpal::Stream>,
    state: DeviceState,
    reported_drops: u64,
}

// SAFETY: `stream` is `None` until `start_streaming` runs on the capture
// thread, and it is dropped in `release` on that same thread. The handle is
// only moved across threads before the stream exists.
unsafe impl Send for CpalStreamHandle {}

impl CpalStreamHandle {
    fn new(device: cpal::Device, config: SupportedStreamConfig, queue_capacity: usize) -> Self {
        Self {
            device,
            config,
            queue_capacity,
            shared: Arc::new(Shared::default()),
            consumer: None,
            stream: None,
            state: DeviceState::Initialized,
            reported_drops: 0,
        }
    }

    fn build_stream(&self, mut producer: SampleProducer) -> Result<cpal::Stream, BackendError> {
        let stream_config: cpal::StreamConfig = self.config.config();
        let channels = usize::from(stream_config.channels.max(1));

        let err_shared = Arc::clone(&self.shared);
        let err_fn = move |err: cpal::StreamError| {
            log::error!("Input stream error: {}", err);
            *err_shared.failure.lock() = Some(err.to_string());
        };

        let shared = Arc::clone(&self.shared);
        let stream = match self.config.sample_format() {
            SampleFormat::I16 => {
                let mut scratch = Vec::new();
                self.device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        downmix_to_mono(data, channels, |s| s, &mut scratch);
                        deliver(&mut producer, &scratch, &shared);
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::F32 => {
                let mut scratch = Vec::new();
                self.device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        downmix_to_mono(data, channels, f32_to_i16, &mut scratch);
                        deliver(&mut producer, &scratch, &shared);
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let mut scratch = Vec::new();
                self.device.build_input_stream(
                    &stream_config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        downmix_to_mono(data, channels, u16_to_i16, &mut scratch);
                        deliver(&mut producer, &scratch, &shared);
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(BackendError::UnsupportedFormat(other)),
        };
        Ok(stream)
    }

    fn report_drops(&mut self) {
        let dropped = self.shared.dropped.load(Ordering::Relaxed);
        if dropped > self.reported_drops {
            log::warn!("Input overrun: {} samples dropped", dropped - self.reported_drops);
            self.reported_drops = dropped;
        }
    }
}

impl DeviceHandle for CpalStreamHandle {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        let (producer, consumer) = sample_queue(self.queue_capacity);
        let stream = self.build_stream(producer)?;
        stream.play().map_err(BackendError::from)?;
        self.stream = Some(stream);
        self.consumer = Some(consumer);
        self.state = DeviceState::Recording;
        log::debug!("cpal input stream playing");
        Ok(())
    }

    fn stop_streaming(&mut self) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause input stream: {}", e);
            }
        }
        self.state = DeviceState::Initialized;
    }

    fn release(&mut self) {
        self.stream = None;
        self.consumer = None;
        self.state = DeviceState::Uninitialized;
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        let deadline = Instant::now() + READ_TIMEOUT;
        let count = loop {
            if let Some(reason) = self.shared.failure.lock().clone() {
                return Err(CaptureError::DeviceReadFailed(reason));
            }
            let Some(consumer) = self.consumer.as_mut() else {
                return Err(CaptureError::DeviceReadFailed("stream not started".into()));
            };
            let count = consumer.pop_slice(buf);
            if count > 0 || buf.is_empty() || Instant::now() >= deadline {
                break count;
            }
            thread::sleep(POLL_INTERVAL);
        };

        self.report_drops();
        Ok(count)
    }
}

/// Lower is preferred; `None` for formats this backend cannot convert.
fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I16 => Some(0),
        SampleFormat::F32 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

/// Average interleaved frames into mono `i16`, replacing the contents of `out`.
///
/// `out` keeps its allocation between callbacks.
fn downmix_to_mono<T: Copy>(data: &[T], channels: usize, convert: impl Fn(T) -> i16, out: &mut Vec<i16>) {
    out.clear();
    if channels <= 1 {
        out.extend(data.iter().map(|&s| convert(s)));
        return;
    }
    out.extend(data.chunks(channels).map(|frame| {
        let sum: i32 = frame.iter().map(|&s| i32::from(convert(s))).sum();
        (sum / frame.len() as i32) as i16
    }));
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32768) as i16
}

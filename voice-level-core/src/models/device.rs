/// Lifecycle of an opened input device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    Uninitialized,
    Initialized,
    Recording,
}

impl DeviceState {
    /// A device is ready once it has left `Uninitialized`.
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }
}

/// Channel layout requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
}

/// Sample representation delivered by `DeviceHandle::read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Signed 16-bit PCM, full scale 32768.
    I16,
}

/// Parameters handed to `InputDevice::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate_hz: u32,
    pub channels: ChannelLayout,
    pub format: SampleFormat,
    /// Device-side buffer size in samples (minimum recommendation times headroom).
    pub buffer_size_samples: usize,
    /// Samples a push-style backend must be able to hold between reads.
    pub queue_capacity_samples: usize,
}

impl StreamSpec {
    pub fn mono_i16(sample_rate_hz: u32, buffer_size_samples: usize, queue_capacity_samples: usize) -> Self {
        Self {
            sample_rate_hz,
            channels: ChannelLayout::Mono,
            format: SampleFormat::I16,
            buffer_size_samples,
            queue_capacity_samples,
        }
    }
}

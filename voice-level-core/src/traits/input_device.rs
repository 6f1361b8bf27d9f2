use crate::models::device::{DeviceState, StreamSpec};
use crate::models::error::CaptureError;

/// Platform input device: the factory side of the capture collaborator.
///
/// Implemented by:
/// - `CpalInputDevice` (voice-level-cpal)
/// - scripted devices in tests
pub trait InputDevice: Send {
    type Handle: DeviceHandle;

    /// Whether the process may record from this device.
    fn has_permission(&self) -> bool {
        true
    }

    /// Smallest device buffer, in samples, the driver accepts at `sample_rate_hz`.
    fn minimum_buffer_size(&self, sample_rate_hz: u32) -> Result<usize, CaptureError>;

    /// Acquire the device. Fails with `PermissionDenied` or `DeviceUnavailable`.
    fn open(&self, spec: &StreamSpec) -> Result<Self::Handle, CaptureError>;
}

/// An opened input device, exclusively owned by one capture thread.
///
/// The handle is moved onto the capture thread right after `open`, so every
/// method below runs on that thread only.
pub trait DeviceHandle: Send + 'static {
    fn state(&self) -> DeviceState;

    fn start_streaming(&mut self) -> Result<(), CaptureError>;

    fn stop_streaming(&mut self);

    /// Release the underlying device. Called exactly once per handle.
    fn release(&mut self);

    /// Blocking read of at most `buf.len()` samples.
    ///
    /// Returns the number of samples written to the front of `buf`. Short
    /// reads, including `Ok(0)`, are normal. An `Err` ends the capture loop.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError>;
}

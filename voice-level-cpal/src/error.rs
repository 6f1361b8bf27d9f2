use thiserror::Error;

use voice_level_core::CaptureError;

/// cpal failures, before they are folded into `CaptureError`.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query input configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

impl BackendError {
    fn is_device_gone(&self) -> bool {
        matches!(
            self,
            Self::Devices(_)
                | Self::SupportedConfigs(cpal::SupportedStreamConfigsError::DeviceNotAvailable)
                | Self::BuildStream(cpal::BuildStreamError::DeviceNotAvailable)
                | Self::PlayStream(cpal::PlayStreamError::DeviceNotAvailable)
        )
    }
}

impl From<BackendError> for CaptureError {
    fn from(err: BackendError) -> Self {
        if err.is_device_gone() {
            CaptureError::DeviceUnavailable(err.to_string())
        } else {
            CaptureError::StreamFailed(err.to_string())
        }
    }
}

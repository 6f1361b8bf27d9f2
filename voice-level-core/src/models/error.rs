use thiserror::Error;

/// Errors that can occur while acquiring or driving the input device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("capture session already running")]
    AlreadyRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("device did not become ready")]
    DeviceInitFailed,

    #[error("device read failed: {0}")]
    DeviceReadFailed(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawnFailed(String),
}

/// Runtime failure reported to the observer from the capture thread.
///
/// Codes are stable and start at `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    InitFailed,
    ReadFailed,
}

impl DeviceErrorKind {
    pub fn code(self) -> i32 {
        match self {
            Self::InitFailed => 1,
            Self::ReadFailed => 2,
        }
    }
}

impl From<DeviceErrorKind> for CaptureError {
    fn from(kind: DeviceErrorKind) -> Self {
        match kind {
            DeviceErrorKind::InitFailed => CaptureError::DeviceInitFailed,
            DeviceErrorKind::ReadFailed => CaptureError::DeviceReadFailed("reported by capture loop".into()),
        }
    }
}

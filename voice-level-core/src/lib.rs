//! # voice-level-core
//!
//! Platform-agnostic microphone level meter.
//!
//! Samples an input device in fixed-size blocks on a dedicated thread,
//! estimates each block's level in decibels, and hands the value to a
//! caller-supplied observer at the rate blocks arrive in real time.
//! Platform backends (cpal) implement the `InputDevice` trait and plug into
//! the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! voice-level-core (this crate)
//! ├── traits/       ← InputDevice, DeviceHandle, LevelObserver
//! ├── models/       ← CaptureConfig, CaptureError, SessionState, StreamSpec
//! ├── processing/   ← decibel estimate, DoubleBuffer, SequenceGuard, pacing
//! └── session/      ← CaptureSession (capture thread lifecycle)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::CaptureConfig;
pub use models::device::{ChannelLayout, DeviceState, SampleFormat, StreamSpec};
pub use models::error::{CaptureError, DeviceErrorKind};
pub use models::state::SessionState;
pub use processing::double_buffer::DoubleBuffer;
pub use processing::sequence_guard::SequenceGuard;
pub use session::capture::CaptureSession;
pub use traits::input_device::{DeviceHandle, InputDevice};
pub use traits::level_observer::LevelObserver;

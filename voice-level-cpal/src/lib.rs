//! # voice-level-cpal
//!
//! cpal input-device backend for voice-level.
//!
//! Provides:
//! - `CpalInputDevice` — microphone input via the default cpal host (ALSA, CoreAudio, WASAPI)
//! - `list_input_devices` — input device enumeration
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use voice_level_core::CaptureSession;
//! use voice_level_cpal::CpalInputDevice;
//!
//! let mic = CpalInputDevice::default_device()?;
//! let mut session = CaptureSession::new(mic);
//! session.start(Arc::new(my_observer))?;
//! ```

pub mod cpal_input;
pub mod device_enumerator;
pub mod error;

pub use cpal_input::{CpalInputDevice, CpalStreamHandle};
pub use device_enumerator::{list_input_devices, InputDeviceInfo};
pub use error::BackendError;

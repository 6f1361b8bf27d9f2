use crate::models::error::DeviceErrorKind;
use crate::models::state::SessionState;

/// Receives decibel estimates and runtime errors from a capture session.
///
/// All methods are called synchronously from the capture thread, never from
/// the thread that called `start`. Implementations must return quickly and
/// must not call back into the session that is invoking them.
pub trait LevelObserver: Send + Sync {
    /// Called once per completed block with its decibel estimate.
    fn on_level(&self, decibel: i32);

    /// Called when the device fails to become ready or a read fails.
    fn on_error(&self, kind: DeviceErrorKind);

    /// Called on every session state transition.
    fn on_state_changed(&self, _state: SessionState) {}
}

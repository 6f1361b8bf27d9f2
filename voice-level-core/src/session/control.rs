use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::CaptureError;
use crate::models::state::SessionState;

struct ControlState {
    state: SessionState,
    running: bool,
}

/// Session state and the cooperative run flag, shared between the session
/// and its capture thread.
///
/// Both live behind one mutex so a stop request and a state transition can
/// never interleave. The condvar lets timed waits on the capture thread end
/// early when a stop is requested.
pub(crate) struct Control {
    inner: Mutex<ControlState>,
    wake: Condvar,
    delivered: AtomicU64,
}

impl Control {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ControlState {
                state: SessionState::Idle,
                running: false,
            }),
            wake: Condvar::new(),
            delivered: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub(crate) fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Idle → Starting, raising the run flag.
    pub(crate) fn begin(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if !inner.state.is_idle() {
            return Err(CaptureError::AlreadyRunning);
        }
        inner.state = SessionState::Starting;
        inner.running = true;
        self.delivered.store(0, Ordering::SeqCst);
        Ok(())
    }

    /// Starting → Running, unless a stop was requested in the meantime.
    pub(crate) fn mark_running(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.running && inner.state == SessionState::Starting {
            inner.state = SessionState::Running;
            true
        } else {
            false
        }
    }

    /// Clear the run flag and wake any pacing or readiness wait.
    ///
    /// Returns `false` if the session was already idle.
    pub(crate) fn request_stop(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state.is_idle() {
            return false;
        }
        inner.state = SessionState::Stopping;
        inner.running = false;
        self.wake.notify_all();
        true
    }

    /// Enter Stopping from the capture thread when the loop ends on its own.
    pub(crate) fn enter_stopping(&self) {
        let mut inner = self.inner.lock();
        inner.running = false;
        if !inner.state.is_idle() {
            inner.state = SessionState::Stopping;
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.state = SessionState::Idle;
        inner.running = false;
    }

    /// Sleep up to `timeout`, returning early on a stop request.
    ///
    /// Returns whether the session is still running afterwards.
    pub(crate) fn wait_while_running(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while inner.running {
            if self.wake.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        inner.running
    }

    pub(crate) fn record_delivery(&self, sequence: u64) {
        self.delivered.store(sequence, Ordering::SeqCst);
    }

    pub(crate) fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

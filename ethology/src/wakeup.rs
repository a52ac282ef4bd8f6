use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// A level-triggered edge used by asynchronous nodes to preempt the
/// inter-tick sleep of `Tree::tick_while_running`.
///
/// `emit` may be called from any thread (typically a threaded action's
/// worker); `wait_for` is only ever called from the tick thread. The flag
/// is cleared as soon as a wait consumes it, so a signal emitted strictly
/// before a call to `wait_for` makes that call return `true` immediately
/// without blocking, and a second, un-emitted `wait_for` blocks up to the
/// requested duration.
#[derive(Clone)]
pub struct WakeupSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl std::fmt::Debug for WakeupSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeupSignal").finish_non_exhaustive()
    }
}

impl WakeupSignal {
    pub fn new() -> WakeupSignal {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Wake up anyone currently blocked in `wait_for`, or arm the signal so
    /// the next call to `wait_for` returns immediately.
    pub fn emit(&self) {
        let (lock, condvar) = &*self.inner;
        let mut woken = lock.lock().unwrap_or_else(|e| e.into_inner());
        *woken = true;
        condvar.notify_all();
    }

    /// Block for up to `timeout`, returning `true` if woken by `emit` and
    /// `false` if the timeout elapsed first. Consumes the signal.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        let woken = lock.lock().unwrap_or_else(|e| e.into_inner());

        let (mut woken, timeout_result) = condvar
            .wait_timeout_while(woken, timeout, |w| !*w)
            .unwrap_or_else(|e| e.into_inner());

        let fired = !timeout_result.timed_out();
        *woken = false;
        fired
    }
}

impl Default for WakeupSignal {
    fn default() -> Self {
        Self::new()
    }
}

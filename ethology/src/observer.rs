//! The status-change event bus: loggers and publishers attach an `Observer`
//! to a `Tree` and get called back on every non-trivial root status
//! transition.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use log::info;

use crate::basic_types::NodeStatus;

/// Registered against a `Tree`; `on_status_change` fires once per tick that
/// actually changes the root's status (an IDLE -> IDLE no-op never fires).
pub trait Observer {
    fn on_status_change(&mut self, node_uid: u16, timestamp_millis: u128, prev_status: NodeStatus, new_status: NodeStatus);
}

pub(crate) fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

/// Logs every transition at `info` level. Only one may be registered per
/// process (matching the source's "one console logger" rule), enforced by
/// `ConsoleObserver::new` rather than by a shared process-wide registry.
pub struct ConsoleObserver {
    _private: (),
}

static CONSOLE_OBSERVER_TAKEN: AtomicBool = AtomicBool::new(false);

impl ConsoleObserver {
    /// Returns `None` if a `ConsoleObserver` already exists anywhere in this
    /// process.
    pub fn new() -> Option<ConsoleObserver> {
        if CONSOLE_OBSERVER_TAKEN.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(ConsoleObserver { _private: () })
        }
    }
}

impl Drop for ConsoleObserver {
    fn drop(&mut self) {
        CONSOLE_OBSERVER_TAKEN.store(false, Ordering::SeqCst);
    }
}

impl Observer for ConsoleObserver {
    fn on_status_change(&mut self, node_uid: u16, timestamp_millis: u128, prev_status: NodeStatus, new_status: NodeStatus) {
        info!("[{timestamp_millis}] node {node_uid}: {prev_status} -> {new_status}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_console_observer_at_a_time() {
        let first = ConsoleObserver::new();
        assert!(first.is_some());

        let second = ConsoleObserver::new();
        assert!(second.is_none());

        drop(first);
        assert!(ConsoleObserver::new().is_some());
    }
}

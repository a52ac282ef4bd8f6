//! The runtime half of the engine: a `Tree` just owns a root node and knows
//! how to drive ticks across it. Everything about turning XML into that
//! root node lives in `xml_loader`.

use std::time::Duration;

use log::debug;

use crate::{
    basic_types::NodeStatus,
    error::BehaviorTreeError,
    nodes::{NodeTick, TreeNode, TreeNodeDefaults, TreeNodePtr},
    observer::{now_millis, Observer},
    wakeup::WakeupSignal,
};

enum TickOption {
    WhileRunning,
    ExactlyOnce,
}

/// An instantiated, ready-to-tick behavior tree.
pub struct Tree {
    root: TreeNodePtr,
    wakeup: WakeupSignal,
    observers: Vec<Box<dyn Observer>>,
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree").field("root", &self.root).field("observer_count", &self.observers.len()).finish()
    }
}

impl Tree {
    /// `wakeup` must be the same signal threaded through every node's
    /// `NodeConfig` when the tree was built, or a threaded action's worker
    /// completing won't preempt `tick_while_running`'s sleep.
    pub fn new(root: TreeNodePtr, wakeup: WakeupSignal) -> Tree {
        Self {
            root,
            wakeup,
            observers: Vec::new(),
        }
    }

    /// The signal threaded-action workers call `emit()` on to preempt the
    /// sleep between ticks in `tick_while_running`.
    pub fn wakeup_signal(&self) -> WakeupSignal {
        self.wakeup.clone()
    }

    /// Attaches an observer; it is notified of every subsequent non-trivial
    /// root status transition.
    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    fn notify_observers(&mut self, prev_status: NodeStatus, new_status: NodeStatus) {
        if prev_status == new_status {
            return;
        }

        let uid = self.root.borrow_mut().config().uid;
        let timestamp = now_millis();

        for observer in self.observers.iter_mut() {
            observer.on_status_change(uid, timestamp, prev_status, new_status);
        }
    }

    fn tick_root(&mut self, opt: TickOption) -> Result<NodeStatus, BehaviorTreeError> {
        loop {
            let prev_status = self.root.borrow().status();
            let status = self.root.borrow_mut().execute_tick()?;
            self.notify_observers(prev_status, status);

            if status.is_completed() {
                self.root.borrow_mut().reset_status();
                return Ok(status);
            }

            match opt {
                TickOption::ExactlyOnce => return Ok(status),
                TickOption::WhileRunning => {
                    debug!("tree still RUNNING; sleeping until woken or polled");
                    self.sleep(Duration::from_millis(10));
                }
            }
        }
    }

    /// Ticks exactly once, whatever the current status, and returns
    /// immediately without looping.
    pub fn tick_exactly_once(&mut self) -> Result<NodeStatus, BehaviorTreeError> {
        self.tick_root(TickOption::ExactlyOnce)
    }

    /// An alias kept for callers that only ever want a single pass; behaves
    /// identically to `tick_exactly_once`.
    pub fn tick_once(&mut self) -> Result<NodeStatus, BehaviorTreeError> {
        self.tick_root(TickOption::ExactlyOnce)
    }

    /// Ticks repeatedly until the root reaches `SUCCESS` or `FAILURE`,
    /// sleeping between ticks (interruptibly, via the tree's wake-up
    /// signal) instead of busy-looping.
    pub fn tick_while_running(&mut self) -> Result<NodeStatus, BehaviorTreeError> {
        self.tick_root(TickOption::WhileRunning)
    }

    /// Halts every running node beneath the root, in depth-first order.
    pub fn halt_tree(&mut self) {
        self.root.borrow_mut().halt();
        self.root.borrow_mut().reset_status();
    }

    /// Blocks the calling thread for up to `duration`, waking early if a
    /// threaded action finishes first.
    pub fn sleep(&self, duration: Duration) -> bool {
        self.wakeup.wait_for(duration)
    }
}

//! Leaf nodes that do work: synchronous actions, coroutine-style stateful
//! actions, and actions that hand off to a background worker thread.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{basic_types::NodeStatus, error::NodeError, nodes::TreeNodeBase, wakeup::WakeupSignal};

mod builtins;
pub use builtins::*;

pub trait ActionNodeBase: TreeNodeBase + ActionNode {}

pub trait ActionNode {
    fn clone_boxed(&self) -> Box<dyn ActionNodeBase>;

    /// Wraps `TreeNode::tick`, rejecting a node that tries to report `IDLE`
    /// as the outcome of being ticked.
    fn execute_action_tick(&mut self) -> Result<NodeStatus, NodeError>;
}

impl Clone for Box<dyn ActionNodeBase> {
    fn clone(&self) -> Box<dyn ActionNodeBase> {
        self.clone_boxed()
    }
}

pub type ActionNodePtr = Rc<RefCell<dyn ActionNodeBase>>;

/// Marker for actions that complete within a single `tick()` call and never
/// return `RUNNING`.
pub trait SyncActionNode {}

/// A coroutine-style action: `on_start` runs once when the node transitions
/// out of `IDLE`, `on_running` runs on every subsequent tick while the node
/// stays `RUNNING`, and `on_halted` runs if the node is interrupted while
/// running.
pub trait StatefulActionNode {
    fn on_start(&mut self) -> Result<NodeStatus, NodeError>;
    fn on_running(&mut self) -> Result<NodeStatus, NodeError>;
    fn on_halted(&mut self) {}
}

/// An action that owns a background worker thread. `start_worker` is
/// spawned once, off the tick thread, and must itself poll `should_halt`
/// periodically and return promptly once it flips to `true`: `halt` blocks
/// the calling thread until the worker reports completion, so the caller
/// never observes `haltTree` returning while a worker is still in flight.
/// The worker reports its outcome through the shared `WakeupSignal` so both
/// `Tree::tick_while_running` and a blocked `halt` stop sleeping as soon as
/// it finishes.
pub trait ThreadedActionNode {
    fn start_worker(&mut self) -> Result<(), NodeError>;
}

/// Shared state a `ThreadedActionNode` implementation hangs its worker
/// thread's lifecycle off of: a halt flag the worker polls, a wake-up
/// signal it fires on completion, and the slot its result lands in.
#[derive(Clone)]
pub struct WorkerHandle {
    pub should_halt: Arc<AtomicBool>,
    pub wakeup: WakeupSignal,
    pub result: Arc<std::sync::Mutex<Option<Result<NodeStatus, String>>>>,
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle").field("should_halt", &self.should_halt.load(Ordering::SeqCst)).finish_non_exhaustive()
    }
}

impl WorkerHandle {
    pub fn new(wakeup: WakeupSignal) -> WorkerHandle {
        Self {
            should_halt: Arc::new(AtomicBool::new(false)),
            wakeup,
            result: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn request_halt(&self) {
        self.should_halt.store(true, Ordering::SeqCst);
    }

    pub fn should_halt(&self) -> bool {
        self.should_halt.load(Ordering::SeqCst)
    }

    pub fn finish(&self, status: Result<NodeStatus, String>) {
        *self.result.lock().unwrap_or_else(|e| e.into_inner()) = Some(status);
        self.wakeup.emit();
    }

    pub fn poll(&self) -> Option<Result<NodeStatus, String>> {
        self.result.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}


use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{ControlNode, NodeHalt, TreeNode},
};

/// Ticks children from the first one every time this node is ticked,
/// stopping at the first child that returns `RUNNING` (which is returned
/// unchanged, without halting it) or `FAILURE` (which halts every child and
/// resets the node's own walk back to the first child). Only when every
/// child reports `SUCCESS` or `SKIPPED` does this node report `SUCCESS`.
///
/// Because it restarts at the first child on every tick, an already-running
/// child's earlier siblings are re-evaluated each time — this is the
/// behavior that makes plain `Sequence` suitable for gating a running
/// action behind conditions that might flip. `SequenceWithMemory` is the
/// variant that skips re-evaluating already-succeeded siblings.
#[bt_node(ControlNode)]
pub struct Sequence {}

impl TreeNode for Sequence {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        for idx in 0..self.children.len() {
            let child_status = self.children[idx].borrow_mut().execute_tick()?;

            match child_status {
                NodeStatus::Failure => {
                    self.halt_children(0)?;
                    return Ok(NodeStatus::Failure);
                }
                NodeStatus::Running => {
                    self.halt_children(idx + 1)?;
                    return Ok(NodeStatus::Running);
                }
                NodeStatus::Success | NodeStatus::Skipped => {}
                NodeStatus::Idle => {
                    return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                }
            }
        }

        self.reset_children();
        Ok(NodeStatus::Success)
    }
}

impl NodeHalt for Sequence {
    fn halt(&mut self) {
        self.reset_children();
    }
}

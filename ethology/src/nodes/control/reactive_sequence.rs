use ethology_derive::bt_node;

use crate::{basic_types::NodeStatus, error::NodeError, nodes::{ControlNode, NodeHalt, TreeNode}};

/// Functionally the same restart-from-zero walk as `Sequence`: named
/// separately so trees can express, via `<ReactiveSequence>`, that the
/// intent is an interrupt-style gate (conditions mixed with a running
/// action) rather than a plain ordered sequence.
#[bt_node(ControlNode)]
pub struct ReactiveSequence {}

impl TreeNode for ReactiveSequence {
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

impl NodeHalt for ReactiveSequence {
    fn halt(&mut self) {
        self.reset_children();
    }
}

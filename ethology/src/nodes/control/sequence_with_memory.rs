use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{ControlNode, NodeHalt, TreeNode},
};

/// Like `Sequence`, but remembers which child was last `RUNNING` and
/// resumes there on the next tick instead of re-evaluating every earlier
/// sibling. A `FAILURE` still halts every child and resets the walk back to
/// the first one; a completed `SUCCESS` resets the same way.
#[bt_node(ControlNode)]
pub struct SequenceWithMemory {
    #[bt(default = "0")]
    child_idx: usize,
}

impl TreeNode for SequenceWithMemory {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        while self.child_idx < self.children.len() {
            let child_status = self.children[self.child_idx].borrow_mut().execute_tick()?;

            match child_status {
                NodeStatus::Failure => {
                    self.halt_children(0)?;
                    self.child_idx = 0;
                    return Ok(NodeStatus::Failure);
                }
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Success | NodeStatus::Skipped => {
                    self.child_idx += 1;
                }
                NodeStatus::Idle => {
                    return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                }
            }
        }

        self.child_idx = 0;
        self.reset_children();

        Ok(NodeStatus::Success)
    }
}

impl NodeHalt for SequenceWithMemory {
    fn halt(&mut self) {
        self.child_idx = 0;
        self.reset_children();
    }
}

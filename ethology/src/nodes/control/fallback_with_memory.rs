use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{ControlNode, NodeHalt, TreeNode},
};

/// Mirror of `SequenceWithMemory` with `SUCCESS`/`FAILURE` swapped: resumes
/// at the child that was last `RUNNING` instead of re-trying earlier
/// siblings that already failed.
#[bt_node(ControlNode)]
pub struct FallbackWithMemory {
    #[bt(default = "0")]
    child_idx: usize,
}

impl TreeNode for FallbackWithMemory {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        while self.child_idx < self.children.len() {
            let child_status = self.children[self.child_idx].borrow_mut().execute_tick()?;

            match child_status {
                NodeStatus::Success => {
                    self.halt_children(0)?;
                    self.child_idx = 0;
                    return Ok(NodeStatus::Success);
                }
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Failure | NodeStatus::Skipped => {
                    self.child_idx += 1;
                }
                NodeStatus::Idle => {
                    return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                }
            }
        }

        self.child_idx = 0;
        self.reset_children();

        Ok(NodeStatus::Failure)
    }
}

impl NodeHalt for FallbackWithMemory {
    fn halt(&mut self) {
        self.child_idx = 0;
        self.reset_children();
    }
}

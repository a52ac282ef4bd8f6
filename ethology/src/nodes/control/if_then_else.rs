use ethology_derive::bt_node;
use log::warn;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{ControlNode, NodeHalt, TreeNode},
};

/// Must have exactly 2 or 3 children and is not reactive: the condition
/// (child 0) is ticked once and its result picks a branch that is then
/// stuck with until it completes. With only 2 children, a failing
/// condition fails the node outright, as if `AlwaysFailure` were the third
/// child.
#[bt_node(ControlNode)]
pub struct IfThenElse {
    #[bt(default = "0")]
    child_idx: usize,
}

impl TreeNode for IfThenElse {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let children_count = self.children.len();
        if !(2..=3).contains(&children_count) {
            return Err(NodeError::StructureError("IfThenElse must have either 2 or 3 children".to_string()));
        }

        self.status = NodeStatus::Running;

        if self.child_idx == 0 {
            let status = self.children[0].borrow_mut().execute_tick()?;
            match status {
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Success => self.child_idx = 1,
                NodeStatus::Failure => {
                    if children_count == 3 {
                        self.child_idx = 2;
                    } else {
                        return Ok(NodeStatus::Failure);
                    }
                }
                NodeStatus::Idle => {
                    return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                }
                NodeStatus::Skipped => warn!("condition child of IfThenElse returned SKIPPED"),
            }
        }

        let status = self.children[self.child_idx].borrow_mut().execute_tick()?;

        match status {
            NodeStatus::Running => Ok(NodeStatus::Running),
            status => {
                self.reset_children();
                self.child_idx = 0;
                Ok(status)
            }
        }
    }
}

impl NodeHalt for IfThenElse {
    fn halt(&mut self) {
        self.child_idx = 0;
        self.reset_children();
    }
}

use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{ControlNode, NodeHalt, TreeNode},
};

/// The reactive sibling of `IfThenElse`: must have 2 or 3 children, and the
/// condition (child 0) is re-evaluated on every tick. If the condition
/// flips while a branch is `RUNNING`, that branch is halted before the
/// other one starts.
#[bt_node(ControlNode)]
pub struct WhileDoElse {}

impl TreeNode for WhileDoElse {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let children_count = self.children.len();
        if !(2..=3).contains(&children_count) {
            return Err(NodeError::StructureError("WhileDoElse must have either 2 or 3 children".to_string()));
        }

        self.status = NodeStatus::Running;

        let condition_status = self.children[0].borrow_mut().execute_tick()?;

        if matches!(condition_status, NodeStatus::Running) {
            return Ok(NodeStatus::Running);
        }

        let status = match condition_status {
            NodeStatus::Success => {
                if children_count == 3 {
                    self.halt_child(2)?;
                }
                self.children[1].borrow_mut().execute_tick()?
            }
            NodeStatus::Failure => {
                if children_count == 3 {
                    self.halt_child(1)?;
                    self.children[2].borrow_mut().execute_tick()?
                } else {
                    NodeStatus::Failure
                }
            }
            NodeStatus::Idle => {
                return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
            }
            NodeStatus::Skipped => NodeStatus::Skipped,
            NodeStatus::Running => unreachable!("handled by the early return above"),
        };

        match status {
            NodeStatus::Running => Ok(NodeStatus::Running),
            status => {
                self.reset_children();
                Ok(status)
            }
        }
    }
}

impl NodeHalt for WhileDoElse {
    fn halt(&mut self) {
        self.reset_children();
    }
}

use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Swaps `SUCCESS` and `FAILURE`; passes `RUNNING`/`SKIPPED` through.
#[bt_node(DecoratorNode)]
pub struct Inverter {}

impl TreeNode for Inverter {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        let child_status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

        match child_status {
            NodeStatus::Success => {
                self.reset_child();
                Ok(NodeStatus::Failure)
            }
            NodeStatus::Failure => {
                self.reset_child();
                Ok(NodeStatus::Success)
            }
            status @ (NodeStatus::Running | NodeStatus::Skipped) => Ok(status),
            NodeStatus::Idle => Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string())),
        }
    }
}

impl NodeHalt for Inverter {
    fn halt(&mut self) {
        self.reset_child();
    }
}

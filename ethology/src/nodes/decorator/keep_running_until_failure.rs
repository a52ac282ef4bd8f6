use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Retries the child forever on `SUCCESS`, reporting `RUNNING` each time;
/// only a `FAILURE` from the child propagates out.
#[bt_node(DecoratorNode)]
pub struct KeepRunningUntilFailure {}

impl TreeNode for KeepRunningUntilFailure {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        let child_status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

        match child_status {
            NodeStatus::Success => {
                self.reset_child();
                Ok(NodeStatus::Running)
            }
            NodeStatus::Failure => {
                self.reset_child();
                Ok(NodeStatus::Failure)
            }
            NodeStatus::Running | NodeStatus::Skipped => Ok(NodeStatus::Running),
            NodeStatus::Idle => Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string())),
        }
    }
}

impl NodeHalt for KeepRunningUntilFailure {
    fn halt(&mut self) {
        self.reset_child();
    }
}

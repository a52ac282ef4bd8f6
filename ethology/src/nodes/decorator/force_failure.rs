use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Always reports `FAILURE` once the child completes, regardless of whether
/// the child itself succeeded.
#[bt_node(DecoratorNode)]
pub struct ForceFailure {}

impl TreeNode for ForceFailure {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        let child_status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

        if child_status.is_completed() {
            self.reset_child();
            return Ok(NodeStatus::Failure);
        }

        Ok(child_status)
    }
}

impl NodeHalt for ForceFailure {
    fn halt(&mut self) {
        self.reset_child();
    }
}

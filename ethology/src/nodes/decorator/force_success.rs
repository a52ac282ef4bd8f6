use ethology_derive::bt_node;

use crate::{
    basic_types::NodeStatus,
    error::NodeError,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Always reports `SUCCESS` once the child completes, regardless of whether
/// the child itself failed.
#[bt_node(DecoratorNode)]
pub struct ForceSuccess {}

impl TreeNode for ForceSuccess {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;

        let child_status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

        if child_status.is_completed() {
            self.reset_child();
            return Ok(NodeStatus::Success);
        }

        Ok(child_status)
    }
}

impl NodeHalt for ForceSuccess {
    fn halt(&mut self) {
        self.reset_child();
    }
}

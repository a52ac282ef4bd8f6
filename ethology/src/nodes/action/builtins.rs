use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::TreeNode,
};

/// Always reports `SUCCESS`. Used pervasively in tests and as the implicit
/// third branch of a two-child `IfThenElse`.
#[bt_node(SyncActionNode)]
pub struct AlwaysSuccess {}

impl TreeNode for AlwaysSuccess {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        Ok(NodeStatus::Success)
    }
}

/// Always reports `FAILURE`.
#[bt_node(SyncActionNode)]
pub struct AlwaysFailure {}

impl TreeNode for AlwaysFailure {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        Ok(NodeStatus::Failure)
    }
}

/// Writes a literal string value onto the blackboard under `output_key`
/// every time it's ticked, then reports `SUCCESS`.
#[bt_node(SyncActionNode)]
pub struct SetBlackboard {}

impl TreeNode for SetBlackboard {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let value: String = self.config.get_input("value")?;
        self.config.set_output("output_key", value);
        Ok(NodeStatus::Success)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("value"), Port::output("output_key"))
    }
}

use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Ticks the child until it completes once, then remembers the result.
/// After that, if `then_skip` is true (the default) the node reports
/// `SKIPPED` forever; if false, it keeps reporting the remembered status.
#[bt_node(DecoratorNode)]
pub struct RunOnce {
    #[bt(default = "false")]
    already_ticked: bool,
    #[bt(default = "NodeStatus::Idle")]
    returned_status: NodeStatus,
}

impl TreeNode for RunOnce {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let then_skip: bool = self.config.get_input("then_skip")?;

        if self.already_ticked {
            return Ok(if then_skip { NodeStatus::Skipped } else { self.returned_status });
        }

        self.status = NodeStatus::Running;

        let status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

        if status.is_completed() {
            self.already_ticked = true;
            self.returned_status = status;
            self.reset_child();
        }

        Ok(status)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("then_skip").default(true))
    }
}

impl NodeHalt for RunOnce {
    fn halt(&mut self) {
        self.reset_child();
    }
}

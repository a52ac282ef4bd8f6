use std::time::{Duration, Instant};

use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Waits `msec` before ticking the child for the first time. Once the
/// delay has elapsed the child is ticked normally and the decorator just
/// forwards its status.
#[bt_node(DecoratorNode)]
pub struct Delay {
    #[bt(default = "None")]
    deadline: Option<Instant>,
}

impl TreeNode for Delay {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let msec: u64 = self.config.get_input("msec")?;

        let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + Duration::from_millis(msec));

        self.status = NodeStatus::Running;

        if Instant::now() < deadline {
            return Ok(NodeStatus::Running);
        }

        let status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

        if status.is_completed() {
            self.reset_child();
            self.deadline = None;
        }

        Ok(status)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("msec"))
    }
}

impl NodeHalt for Delay {
    fn halt(&mut self) {
        self.deadline = None;
        self.reset_child();
    }
}

use std::time::{Duration, Instant};

use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Starts a wall-clock deadline on the first tick after a reset. If the
/// child is still `RUNNING` once `msec` has elapsed, it is halted and the
/// node reports `FAILURE`.
#[bt_node(DecoratorNode)]
pub struct Timeout {
    #[bt(default = "None")]
    deadline: Option<Instant>,
}

impl TreeNode for Timeout {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let msec: u64 = self.config.get_input("msec")?;

        let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + Duration::from_millis(msec));

        self.status = NodeStatus::Running;

        if Instant::now() >= deadline {
            self.reset_child();
            self.deadline = None;
            return Ok(NodeStatus::Failure);
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

impl NodeHalt for Timeout {
    fn halt(&mut self) {
        self.deadline = None;
        self.reset_child();
    }
}

use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Ticks the child repeatedly as long as it succeeds, until it has
/// succeeded `num_cycles` times (or forever, if `num_cycles` is `-1`). A
/// single `FAILURE` from the child fails the whole node.
#[bt_node(DecoratorNode)]
pub struct Repeat {
    #[bt(default = "-1")]
    num_cycles: i32,
    #[bt(default = "0")]
    repeat_count: usize,
    #[bt(default = "true")]
    all_skipped: bool,
}

impl TreeNode for Repeat {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.num_cycles = self.config.get_input("num_cycles")?;

        let mut do_loop = (self.repeat_count as i32) < self.num_cycles || self.num_cycles == -1;

        if matches!(self.status, NodeStatus::Idle) {
            self.all_skipped = true;
        }

        self.status = NodeStatus::Running;

        while do_loop {
            let child_status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

            self.all_skipped &= matches!(child_status, NodeStatus::Skipped);

            match child_status {
                NodeStatus::Success => {
                    self.repeat_count += 1;
                    do_loop = (self.repeat_count as i32) < self.num_cycles || self.num_cycles == -1;
                    self.reset_child();
                }
                NodeStatus::Failure => {
                    self.repeat_count = 0;
                    self.reset_child();
                    return Ok(NodeStatus::Failure);
                }
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Skipped => {
                    self.reset_child();
                    return Ok(NodeStatus::Skipped);
                }
                NodeStatus::Idle => {
                    return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                }
            }
        }

        self.repeat_count = 0;

        Ok(if self.all_skipped { NodeStatus::Skipped } else { NodeStatus::Success })
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("num_cycles").default(-1i32))
    }
}

impl NodeHalt for Repeat {
    fn halt(&mut self) {
        self.repeat_count = 0;
        self.reset_child();
    }
}

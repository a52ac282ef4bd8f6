use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{DecoratorNode, NodeHalt, TreeNode},
};

/// Ticks the child, retrying up to `num_attempts` times (or forever if
/// `-1`) as long as it fails. A single `SUCCESS` from the child succeeds
/// the whole node.
#[bt_node(DecoratorNode)]
pub struct RetryUntilSuccessful {
    #[bt(default = "-1")]
    max_attempts: i32,
    #[bt(default = "0")]
    try_count: usize,
    #[bt(default = "true")]
    all_skipped: bool,
}

impl TreeNode for RetryUntilSuccessful {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.max_attempts = self.config.get_input("num_attempts")?;

        let mut do_loop = (self.try_count as i32) < self.max_attempts || self.max_attempts == -1;

        if matches!(self.status, NodeStatus::Idle) {
            self.all_skipped = true;
        }

        self.status = NodeStatus::Running;

        while do_loop {
            let child_status = self.child.as_ref().unwrap().borrow_mut().execute_tick()?;

            self.all_skipped &= matches!(child_status, NodeStatus::Skipped);

            match child_status {
                NodeStatus::Success => {
                    self.try_count = 0;
                    self.reset_child();
                    return Ok(NodeStatus::Success);
                }
                NodeStatus::Failure => {
                    self.try_count += 1;
                    do_loop = (self.try_count as i32) < self.max_attempts || self.max_attempts == -1;
                    self.reset_child();
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

        self.try_count = 0;

        Ok(if self.all_skipped { NodeStatus::Skipped } else { NodeStatus::Failure })
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("num_attempts").default(-1i32))
    }
}

impl NodeHalt for RetryUntilSuccessful {
    fn halt(&mut self) {
        self.try_count = 0;
        self.reset_child();
    }
}

use std::collections::HashSet;

use ethology_derive::bt_node;

use crate::{
    basic_types::{NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{ControlNode, NodeHalt, TreeNode},
};

/// Ticks every not-yet-completed child on every call, until either the
/// success threshold or the failure threshold is reached. Thresholds may be
/// given as a negative count, meaning "all but N children" (`-1` is the
/// BT.CPP convention for "all of them").
#[bt_node(ControlNode)]
pub struct Parallel {
    #[bt(default = "-1")]
    success_threshold: i32,
    #[bt(default = "1")]
    failure_threshold: i32,
    #[bt(default = "HashSet::new()")]
    completed: HashSet<usize>,
    #[bt(default = "0")]
    success_count: usize,
    #[bt(default = "0")]
    failure_count: usize,
}

impl Parallel {
    fn resolve_threshold(&self, threshold: i32) -> usize {
        if threshold < 0 {
            ((self.children.len() as i32) + threshold + 1).max(0) as usize
        } else {
            threshold as usize
        }
    }

    fn clear(&mut self) {
        self.completed.clear();
        self.success_count = 0;
        self.failure_count = 0;
    }
}

impl TreeNode for Parallel {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.success_threshold = self.config.get_input("success_count")?;
        self.failure_threshold = self.config.get_input("failure_count")?;

        let children_count = self.children.len();
        let required_success = self.resolve_threshold(self.success_threshold);
        let required_failure = self.resolve_threshold(self.failure_threshold);

        let mut skipped_count = 0;

        for i in 0..children_count {
            if !self.completed.contains(&i) {
                let child_status = self.children[i].borrow_mut().execute_tick()?;

                match child_status {
                    NodeStatus::Skipped => skipped_count += 1,
                    NodeStatus::Success => {
                        self.completed.insert(i);
                        self.success_count += 1;
                    }
                    NodeStatus::Failure => {
                        self.completed.insert(i);
                        self.failure_count += 1;
                    }
                    NodeStatus::Running => {}
                    NodeStatus::Idle => {
                        return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                    }
                }
            }

            if self.success_count >= required_success {
                self.clear();
                self.reset_children();
                return Ok(NodeStatus::Success);
            }

            if self.failure_count >= required_failure {
                self.clear();
                self.reset_children();
                return Ok(NodeStatus::Failure);
            }
        }

        if skipped_count == children_count && children_count > 0 {
            Ok(NodeStatus::Skipped)
        } else {
            Ok(NodeStatus::Running)
        }
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(
            Port::input("success_count").default(-1i32),
            Port::input("failure_count").default(1i32),
        )
    }
}

impl NodeHalt for Parallel {
    fn halt(&mut self) {
        self.clear();
        self.halt_control();
    }
}

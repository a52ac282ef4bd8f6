use ethology_derive::bt_node;

use crate::{basic_types::NodeStatus, error::NodeError, nodes::{ControlNode, NodeHalt, TreeNode}};

/// Mirror of `ReactiveSequence` with `SUCCESS`/`FAILURE` swapped.
#[bt_node(ControlNode)]
pub struct ReactiveFallback {}

impl TreeNode for ReactiveFallback {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        self.status = NodeStatus::Running;
        let mut all_skipped = true;

        for idx in 0..self.children.len() {
            let child_status = self.children[idx].borrow_mut().execute_tick()?;
            all_skipped &= child_status == NodeStatus::Skipped;

            match child_status {
                NodeStatus::Success => {
                    self.halt_children(0)?;
                    return Ok(NodeStatus::Success);
                }
                NodeStatus::Running => {
                    self.halt_children(idx + 1)?;
                    return Ok(NodeStatus::Running);
                }
                NodeStatus::Failure | NodeStatus::Skipped => {}
                NodeStatus::Idle => {
                    return Err(NodeError::StatusError(self.config.path.clone(), "IDLE".to_string()))
                }
            }
        }

        self.reset_children();
        Ok(if all_skipped { NodeStatus::Skipped } else { NodeStatus::Failure })
    }
}

impl NodeHalt for ReactiveFallback {
    fn halt(&mut self) {
        self.reset_children();
    }
}

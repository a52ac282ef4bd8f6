use ethology::{
    basic_types::{BTToString, NodeStatus, Port, PortsList},
    error::NodeError,
    macros::define_ports,
    nodes::{StatefulActionNode, TreeNode},
};
use ethology_derive::bt_node;
use log::info;

pub fn test_setup() {
    let _ = pretty_env_logger::formatted_builder().filter_level(log::LevelFilter::Info).is_test(true).try_init();
}

/// Returns whatever `status` port it's given.
#[bt_node(SyncActionNode)]
pub struct StatusNode {}

impl TreeNode for StatusNode {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let status: NodeStatus = self.config.get_input("status")?;
        info!("StatusNode returning {}", status.bt_to_string());
        Ok(status)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("status"))
    }
}

/// Succeeds `iters` times, then fails forever.
#[bt_node(SyncActionNode)]
pub struct SuccessThenFailure {
    #[bt(default = "0")]
    iter: usize,
}

impl TreeNode for SuccessThenFailure {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let max_iters: usize = self.config.get_input("iters")?;

        if self.iter < max_iters {
            self.iter += 1;
            Ok(NodeStatus::Success)
        } else {
            Ok(NodeStatus::Failure)
        }
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("iters"))
    }
}

#[bt_node(SyncActionNode)]
pub struct EchoNode {}

impl TreeNode for EchoNode {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let msg: String = self.config.get_input("msg")?;
        info!("{msg}");
        Ok(NodeStatus::Success)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("msg"))
    }
}

/// Stays `RUNNING` for `iters` ticks, then reports `status`.
#[bt_node(StatefulActionNode)]
pub struct RunForNode {
    #[bt(default = "0")]
    counter: usize,
}

impl TreeNode for RunForNode {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        unreachable!("StatefulActionNode dispatches through on_start/on_running, not tick")
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("iters"), Port::input("status").default(NodeStatus::Success))
    }
}

impl StatefulActionNode for RunForNode {
    fn on_start(&mut self) -> Result<NodeStatus, NodeError> {
        self.counter = 0;
        Ok(NodeStatus::Running)
    }

    fn on_running(&mut self) -> Result<NodeStatus, NodeError> {
        let limit: usize = self.config.get_input("iters")?;

        if self.counter < limit {
            self.counter += 1;
            Ok(NodeStatus::Running)
        } else {
            self.config.get_input("status")
        }
    }
}

/// Fails the first tick it's ticked after construction, then panics if
/// ticked again — used to assert a node is ticked exactly once per test.
#[bt_node(SyncActionNode)]
pub struct TickOnceThenPanic {}

impl TreeNode for TickOnceThenPanic {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let status: NodeStatus = self.config.get_input("status")?;
        Ok(status)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("status"))
    }
}

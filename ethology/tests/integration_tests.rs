//! End-to-end scenarios exercising the pieces the per-module test files
//! don't: a threaded action driven all the way through `Tree`, subtree
//! remapping actually crossing a blackboard boundary, and a user error
//! surfacing out of `tick_while_running`.

use std::time::Duration;

use ethology::{
    basic_types::{NodeStatus, Port, PortsList},
    blackboard::Blackboard,
    error::{BehaviorTreeError, NodeError, RuntimeError},
    macros::{define_ports, register_action_node},
    nodes::{ThreadedActionNode, TreeNode, WorkerHandle},
    xml_loader::Factory,
};
use ethology_derive::bt_node;

mod nodes;

/// Finishes `Success` from a background thread after a short sleep, proving
/// a `ThreadedActionNode` can report completion and wake a sleeping
/// `tick_while_running` rather than waiting out its poll interval.
#[bt_node(ThreadedActionNode)]
pub struct BackgroundEcho {}

impl TreeNode for BackgroundEcho {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        unreachable!("ThreadedActionNode dispatches through start_worker, not tick")
    }
}

impl ThreadedActionNode for BackgroundEcho {
    fn start_worker(&mut self) -> Result<(), NodeError> {
        let handle = WorkerHandle::new(self.config.wakeup());
        self.worker = Some(handle.clone());

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(25));
            handle.finish(Ok(NodeStatus::Success));
        });

        Ok(())
    }
}

/// Copies its `value` input to its `out` output, used to prove a leaf
/// instantiated under a `<SubTree>` is actually bound to that subtree's
/// blackboard rather than the factory's root one.
#[bt_node(SyncActionNode)]
pub struct WritePort {}

impl TreeNode for WritePort {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        let value: String = self.config.get_input("value")?;
        self.config.set_output("out", value);
        Ok(NodeStatus::Success)
    }

    fn provided_ports(&self) -> PortsList {
        define_ports!(Port::input("value"), Port::output("out"))
    }
}

/// Always fails with a user error, proving tick failures propagate out of
/// `Tree` instead of being swallowed as `Failure`.
#[bt_node(SyncActionNode)]
pub struct BoomNode {}

impl TreeNode for BoomNode {
    fn tick(&mut self) -> Result<NodeStatus, NodeError> {
        Err(NodeError::UserError(anyhow::anyhow!("boom")))
    }
}

#[test]
fn threaded_action_wakes_the_tree_promptly() {
    nodes::test_setup();

    let xml = r#"
        <root main_tree_to_execute="main">
            <BehaviorTree ID="main">
                <BackgroundEcho />
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "BackgroundEcho", BackgroundEcho).unwrap();
    let blackboard = Blackboard::new_ptr();

    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let started = std::time::Instant::now();
    let status = tree.tick_while_running().unwrap();
    let elapsed = started.elapsed();

    assert!(matches!(status, NodeStatus::Success));
    // The worker sleeps 25ms; tick_while_running's poll interval is 10ms.
    // If the wake-up signal weren't shared this would have to wait out a
    // full extra poll sleep past completion; it shouldn't take anywhere
    // close to, say, ten poll intervals.
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?} to notice the worker finished");
}

#[test]
fn halting_a_threaded_action_requests_its_worker_to_stop() {
    nodes::test_setup();

    let xml = r#"
        <root main_tree_to_execute="main">
            <BehaviorTree ID="main">
                <BackgroundEcho />
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "BackgroundEcho", BackgroundEcho).unwrap();
    let blackboard = Blackboard::new_ptr();

    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_exactly_once().unwrap();
    assert!(matches!(status, NodeStatus::Running));

    // Shouldn't panic or deadlock even though the worker is still asleep.
    tree.halt_tree();
}

#[test]
fn subtree_remap_crosses_the_blackboard_boundary() {
    nodes::test_setup();

    let xml = r#"
        <root main_tree_to_execute="main">
            <BehaviorTree ID="main">
                <SubTree ID="writer" value="{parent_value}" out="{parent_out}" />
            </BehaviorTree>

            <BehaviorTree ID="writer">
                <WritePort value="{value}" out="{out}" />
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "WritePort", WritePort).unwrap();
    let blackboard = Blackboard::new_ptr();
    blackboard.borrow_mut().write("parent_value", "hello".to_string());

    let mut tree = factory.create_tree_from_text(xml, blackboard.clone()).unwrap();
    let status = tree.tick_while_running().unwrap();

    assert!(matches!(status, NodeStatus::Success));
    assert_eq!(blackboard.borrow().read::<String>("parent_out"), Some("hello".to_string()));
}

#[test]
fn nested_subtree_remap_still_reaches_the_root_blackboard() {
    nodes::test_setup();

    let xml = r#"
        <root main_tree_to_execute="main">
            <BehaviorTree ID="main">
                <SubTree ID="middle" value="{root_value}" out="{root_out}" />
            </BehaviorTree>

            <BehaviorTree ID="middle">
                <SubTree ID="writer" value="{value}" out="{out}" />
            </BehaviorTree>

            <BehaviorTree ID="writer">
                <WritePort value="{value}" out="{out}" />
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "WritePort", WritePort).unwrap();
    let blackboard = Blackboard::new_ptr();
    blackboard.borrow_mut().write("root_value", "nested".to_string());

    let mut tree = factory.create_tree_from_text(xml, blackboard.clone()).unwrap();
    let status = tree.tick_while_running().unwrap();

    assert!(matches!(status, NodeStatus::Success));
    assert_eq!(blackboard.borrow().read::<String>("root_out"), Some("nested".to_string()));
}

#[test]
fn a_node_error_propagates_out_of_tick_while_running() {
    nodes::test_setup();

    let xml = r#"
        <root main_tree_to_execute="main">
            <BehaviorTree ID="main">
                <BoomNode />
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "BoomNode", BoomNode).unwrap();
    let blackboard = Blackboard::new_ptr();

    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let result = tree.tick_while_running();
    assert!(matches!(result, Err(BehaviorTreeError::Runtime(RuntimeError::Node(NodeError::UserError(_))))));
}

#[test]
fn blackboard_write_read_round_trip() {
    let blackboard = Blackboard::new_ptr();
    blackboard.borrow_mut().write("count", 3i32);

    assert!(blackboard.borrow().contains("count"));
    assert_eq!(blackboard.borrow().read::<i32>("count"), Some(3));
    assert_eq!(blackboard.borrow().get::<i32>("count").unwrap(), Some(3));
    assert!(blackboard.borrow().get::<String>("count").is_err());
}

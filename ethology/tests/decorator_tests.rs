use ethology::{basic_types::NodeStatus, blackboard::Blackboard, macros::register_action_node, xml_loader::Factory};
use log::{error, info};

mod nodes;

use nodes::{RunForNode, StatusNode, SuccessThenFailure};

#[test]
fn force_failure() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <ForceFailure>
                    <StatusNode status="Success" />
                </ForceFailure>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => {
            info!("{status:?}");
            assert!(matches!(status, NodeStatus::Failure));
        }
        Err(e) => error!("{e}"),
    }
}

#[test]
fn force_success() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <ForceSuccess>
                    <StatusNode status="Failure" />
                </ForceSuccess>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => {
            info!("{status:?}");
            assert!(matches!(status, NodeStatus::Success));
        }
        Err(e) => error!("{e}"),
    }
}

#[test]
fn inverter() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Inverter>
                    <StatusNode status="Success" />
                </Inverter>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => {
            info!("{status:?}");
            assert!(matches!(status, NodeStatus::Failure));
        }
        Err(e) => error!("{e}"),
    }
}

#[test]
fn keep_running_until_failure() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <KeepRunningUntilFailure>
                    <StatusNode status="Failure" />
                </KeepRunningUntilFailure>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => {
            info!("{status:?}");
            assert!(matches!(status, NodeStatus::Failure));
        }
        Err(e) => error!("{e}"),
    }
}

#[test]
fn repeat() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Repeat num_cycles="5">
                    <SuccessThenFailure iters="3" />
                </Repeat>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "SuccessThenFailure", SuccessThenFailure).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => {
            info!("{status:?}");
            assert!(matches!(status, NodeStatus::Failure));
        }
        Err(e) => error!("{e}"),
    }
}

#[test]
fn retry_until_successful() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <RetryUntilSuccessful num_attempts="5">
                    <SuccessThenFailure iters="0" />
                </RetryUntilSuccessful>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "SuccessThenFailure", SuccessThenFailure).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => {
            info!("{status:?}");
            assert!(matches!(status, NodeStatus::Failure));
        }
        Err(e) => error!("{e}"),
    }
}

#[test]
fn run_once() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <RunOnce then_skip="true">
                    <SuccessThenFailure iters="3" />
                </RunOnce>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "SuccessThenFailure", SuccessThenFailure).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let first = tree.tick_exactly_once().unwrap();
    assert!(matches!(first, NodeStatus::Success));

    let second = tree.tick_exactly_once().unwrap();
    assert!(matches!(second, NodeStatus::Skipped));
}

#[test]
fn timeout_fails_a_child_still_running_past_its_deadline() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Timeout msec="10">
                    <RunForNode iters="1000000" />
                </Timeout>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "RunForNode", RunForNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Failure));
}

#[test]
fn delay_holds_running_before_ticking_its_child() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Delay msec="10">
                    <StatusNode status="Success" />
                </Delay>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let first = tree.tick_exactly_once().unwrap();
    assert!(matches!(first, NodeStatus::Running));

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

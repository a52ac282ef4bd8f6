use ethology::{basic_types::NodeStatus, blackboard::Blackboard, macros::register_action_node, xml_loader::Factory};
use log::{error, info};

mod nodes;

use nodes::{EchoNode, RunForNode, StatusNode};

#[test]
fn fallback() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Fallback>
                    <StatusNode status="Failure" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Success" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Success" />
                </Fallback>
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
        Err(e) => panic!("{e}"),
    }
}

#[test]
fn fallback_with_memory_does_not_re_tick_succeeded_children() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Sequence>
                    <FallbackWithMemory>
                        <StatusNode status="Failure" />
                        <RunForNode iters="2" status="Success" />
                    </FallbackWithMemory>
                    <EchoNode msg="reached the end" />
                </Sequence>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "EchoNode", EchoNode).unwrap();
    register_action_node!(factory, "RunForNode", RunForNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

#[test]
fn if_then_else() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <IfThenElse>
                    <StatusNode status="Failure" />
                    <EchoNode msg="Success branch" />
                    <EchoNode msg="Failure branch" />
                </IfThenElse>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "EchoNode", EchoNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => info!("Final status: {status:?}"),
        Err(e) => error!("{e}"),
    }
}

#[test]
fn parallel_success_threshold() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Parallel success_count="2" failure_count="-1">
                    <StatusNode status="Success" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Success" />
                </Parallel>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

#[test]
fn parallel_failure_threshold() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Parallel failure_count="2" success_count="-1">
                    <StatusNode status="Success" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Failure" />
                    <StatusNode status="Success" />
                    <StatusNode status="Success" />
                </Parallel>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Failure));
}

#[test]
fn reactive_fallback() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <ReactiveFallback>
                    <StatusNode status="Failure" />
                    <EchoNode msg="I am echoing!" />
                </ReactiveFallback>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "EchoNode", EchoNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

#[test]
fn reactive_sequence_re_ticks_earlier_children_every_pass() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <ReactiveSequence>
                    <StatusNode status="Success" />
                    <RunForNode iters="3" />
                </ReactiveSequence>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "RunForNode", RunForNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

#[test]
fn sequence_with_memory_does_not_re_tick_succeeded_children() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <SequenceWithMemory>
                    <StatusNode status="Success" />
                    <RunForNode iters="3" />
                </SequenceWithMemory>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "RunForNode", RunForNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

#[test]
fn sequence_vanilla() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <Sequence>
                    <StatusNode status="Success" />
                    <EchoNode msg="I should echo only once!" />
                    <RunForNode iters="3" />
                    <EchoNode msg="I should be the last echo!" />
                </Sequence>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "EchoNode", EchoNode).unwrap();
    register_action_node!(factory, "RunForNode", RunForNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    let status = tree.tick_while_running().unwrap();
    assert!(matches!(status, NodeStatus::Success));
}

#[test]
fn while_do_else() {
    nodes::test_setup();

    let xml = r#"
        <root>
            <BehaviorTree ID="main">
                <WhileDoElse>
                    <StatusNode status="Failure" />
                    <RunForNode iters="3" />
                    <EchoNode msg="I should echo when StatusNode == Failure!" />
                </WhileDoElse>
            </BehaviorTree>
        </root>
    "#;

    let mut factory = Factory::new();
    register_action_node!(factory, "StatusNode", StatusNode).unwrap();
    register_action_node!(factory, "EchoNode", EchoNode).unwrap();
    register_action_node!(factory, "RunForNode", RunForNode).unwrap();

    let blackboard = Blackboard::new_ptr();
    let mut tree = factory.create_tree_from_text(xml, blackboard).unwrap();

    match tree.tick_while_running() {
        Ok(status) => info!("Final status: {status:?}"),
        Err(e) => error!("{e}"),
    }
}

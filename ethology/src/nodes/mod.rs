//! The node trait hub: every node kind (action, condition, control,
//! decorator) implements `TreeNode` plus the defaults `ethology-derive`
//! generates for it, and is ticked polymorphically through `NodeTick`.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::trace;

use crate::{
    basic_types::{self, BTToString, NodeStatus, PortDirection, PortValue, PortsList, PortsRemapping, StringInto, TreeNodeManifest},
    blackboard::BlackboardPtr,
    error::NodeError,
    wakeup::WakeupSignal,
};

pub mod action;
pub mod control;
pub mod decorator;

pub use action::*;
pub use control::*;
pub use decorator::*;

/// Anything that can sit in a tree and be ticked.
pub trait TreeNodeBase: TreeNode + TreeNodeDefaults + GetNodeType + NodeTick + NodeHalt {}

pub type TreeNodePtr = Rc<RefCell<dyn TreeNodeBase>>;

/// The user-facing part of a node: what it actually does when ticked.
/// `tick` is the method node authors write; `execute_tick`, generated per
/// node kind by `ethology-derive`, wraps it with the contract checks each
/// kind enforces (conditions never return `RUNNING`, sync actions never
/// return `RUNNING`, decorators refuse to tick without a child, etc).
/// Interrupting a running node is a separate concern, `NodeHalt`.
pub trait TreeNode: std::fmt::Debug {
    fn tick(&mut self) -> Result<NodeStatus, NodeError>;

    fn provided_ports(&self) -> PortsList {
        HashMap::new()
    }
}

/// Bookkeeping every node gets for free via `#[derive(TreeNodeDefaults)]`.
pub trait TreeNodeDefaults {
    fn status(&self) -> NodeStatus;
    fn reset_status(&mut self);
    fn set_status(&mut self, status: NodeStatus);
    fn config(&mut self) -> &mut NodeConfig;
    fn into_boxed(self) -> Box<dyn TreeNodeBase>;
    fn to_tree_node_ptr(&self) -> TreeNodePtr;
    fn clone_node_boxed(&self) -> Box<dyn TreeNodeBase>;
}

/// The polymorphic tick entry point the tree runtime actually calls.
pub trait NodeTick {
    fn execute_tick(&mut self) -> Result<NodeStatus, NodeError>;
}

/// A node that needs to be told explicitly when it's interrupted mid-run,
/// beyond the default no-op `TreeNode::halt`.
pub trait NodeHalt {
    fn halt(&mut self);
}

pub trait ConditionNode {}

pub trait GetNodeType {
    fn node_type(&self) -> basic_types::NodeType;
}

pub trait PortClone {
    fn clone_port(&self) -> Box<dyn PortValue>;
}

impl<T> PortClone for T
where
    T: 'static + std::any::Any + std::fmt::Debug + basic_types::BTToString + Clone,
{
    fn clone_port(&self) -> Box<dyn PortValue> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn PortValue> {
    fn clone(&self) -> Box<dyn PortValue> {
        self.clone_port()
    }
}

impl Clone for Box<dyn TreeNodeBase> {
    fn clone(&self) -> Box<dyn TreeNodeBase> {
        self.clone_node_boxed()
    }
}

/// A gate evaluated on a node's blackboard-derived inputs before the node
/// itself is ticked, e.g. `_skipIf="{done}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PreCond {
    FailureIf,
    SuccessIf,
    SkipIf,
    WhileTrue,
}

/// A hook evaluated after a node's tick completes, e.g. `_onSuccess="..."`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PostCond {
    OnHalted,
    OnFailure,
    OnSuccess,
    Always,
}

/// Everything a node needs besides its own fields: where its ports are
/// bound, which blackboard it reads/writes, and its manifest for default
/// values and introspection.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub blackboard: BlackboardPtr,
    pub wakeup: WakeupSignal,
    pub input_ports: PortsRemapping,
    pub output_ports: PortsRemapping,
    pub manifest: Option<Rc<TreeNodeManifest>>,
    pub uid: u16,
    pub path: String,
    pub pre_conditions: HashMap<PreCond, String>,
    pub post_conditions: HashMap<PostCond, String>,
}

impl NodeConfig {
    pub fn new(blackboard: BlackboardPtr, wakeup: WakeupSignal) -> NodeConfig {
        Self {
            blackboard,
            wakeup,
            input_ports: HashMap::new(),
            output_ports: HashMap::new(),
            manifest: None,
            uid: 0,
            path: String::new(),
            pre_conditions: HashMap::new(),
            post_conditions: HashMap::new(),
        }
    }

    pub fn blackboard(&self) -> &BlackboardPtr {
        &self.blackboard
    }

    /// A `ThreadedActionNode`'s worker reports completion through this
    /// signal so `Tree::tick_while_running` stops sleeping as soon as it's
    /// done, instead of waiting out the rest of its poll interval.
    pub fn wakeup(&self) -> WakeupSignal {
        self.wakeup.clone()
    }

    pub fn add_port(&mut self, direction: PortDirection, name: String, value: String) {
        match direction {
            PortDirection::Input => {
                self.input_ports.insert(name, value);
            }
            PortDirection::Output => {
                self.output_ports.insert(name, value);
            }
            PortDirection::InOut => {
                self.input_ports.insert(name.clone(), value.clone());
                self.output_ports.insert(name, value);
            }
        };
    }

    pub fn has_port(&self, direction: &PortDirection, name: &str) -> bool {
        match direction {
            PortDirection::Input => self.input_ports.contains_key(name),
            PortDirection::Output => self.output_ports.contains_key(name),
            PortDirection::InOut => self.input_ports.contains_key(name) || self.output_ports.contains_key(name),
        }
    }

    pub fn manifest(&self) -> Result<Rc<TreeNodeManifest>, NodeError> {
        self.manifest
            .as_ref()
            .cloned()
            .ok_or_else(|| NodeError::PortError(self.path.clone()))
    }

    pub fn set_manifest(&mut self, manifest: Rc<TreeNodeManifest>) {
        self.manifest = Some(manifest);
    }

    /// Reads an input port, resolving the `{key}`/`{=}` blackboard pointer
    /// syntaxes and falling back to the port's declared default when the
    /// XML attribute was left empty. `get_input!` is sugar over this that
    /// infers `T` from the call site.
    pub fn get_input<T>(&self, port: &str) -> Result<T, NodeError>
    where
        T: Clone + 'static,
        String: StringInto<T>,
    {
        use crate::blackboard::BlackboardString;

        match self.input_ports.get(port) {
            Some(raw) if raw.is_empty() => match self.manifest() {
                Ok(manifest) => match manifest.ports.get(port).and_then(|p| p.default_value()) {
                    Some(default) => default
                        .bt_to_string()
                        .string_into()
                        .map_err(|_| NodeError::PortError(port.to_string())),
                    None => Err(NodeError::PortError(port.to_string())),
                },
                Err(_) => Err(NodeError::PortError(port.to_string())),
            },
            Some(raw) => match raw.strip_bb_pointer() {
                Some(inner) => {
                    let key = if inner == "=" { port.to_string() } else { inner };

                    self.blackboard.borrow().get::<T>(&key)?.ok_or_else(|| NodeError::BlackboardError(key))
                }
                None => raw
                    .string_into()
                    .map_err(|_| NodeError::PortValueParseError(port.to_string(), std::any::type_name::<T>().to_string())),
            },
            None => Err(NodeError::PortError(port.to_string())),
        }
    }

    /// Writes an output port, honoring a `{key}`/`{=}` remap if the tree
    /// declared one, or else writing under the port's own name.
    pub fn set_output<T>(&self, port: &str, value: T)
    where
        T: Clone + std::fmt::Debug + 'static,
    {
        use crate::blackboard::BlackboardString;

        let key = match self.output_ports.get(port) {
            Some(raw) => raw
                .strip_bb_pointer()
                .map(|inner| if inner == "=" { port.to_string() } else { inner })
                .unwrap_or_else(|| port.to_string()),
            None => port.to_string(),
        };

        self.blackboard.borrow_mut().write(&key, value);
        trace!("wrote output port [{port}] on [{}]", self.path);
    }
}

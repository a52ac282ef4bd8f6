use thiserror::Error;

use crate::xml_loader::ParseError;

/// Node-local failures: bad indices, missing ports/children, bad blackboard
/// access, or a node breaking its own contract (condition returning
/// `RUNNING`, a sync action returning `IDLE`, etc).
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("out of bounds child index")]
    IndexError,
    #[error("couldn't find port [{0}]")]
    PortError(String),
    #[error("couldn't parse port [{0}] value into the requested type [{1}]")]
    PortValueParseError(String, String),
    #[error("couldn't find entry [{0}] in blackboard")]
    BlackboardError(String),
    #[error("blackboard entry [{0}] already holds a value of a different type")]
    TypeMismatch(String),
    #[error("node [{0}] illegally returned status [{1}]")]
    StatusError(String, String),
    #[error("decorator node has no child attached")]
    ChildMissing,
    #[error("node structure error: {0}")]
    StructureError(String),
    #[error("internal lock was poisoned; the tree is no longer usable")]
    LockPoisoned,
    #[error(transparent)]
    UserError(#[from] anyhow::Error),
}

/// Programmer-visible mistakes: the class of error that indicates the tree
/// or plugin was built incorrectly, not that something went wrong at
/// runtime against otherwise-correct data.
#[derive(Error, Debug)]
pub enum LogicError {
    #[error("the tree definition is invalid: {0}")]
    InvalidTree(String),
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Operational failures encountered while a tree is actually running.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to load plugin: {0}")]
    PluginLoadFailure(String),
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// The umbrella error of the engine: every tree-origin failure funnels
/// through one of these two variants so a caller that doesn't care about
/// the distinction can match on just this type, while a caller that needs
/// detail can match the inner `LogicError`/`RuntimeError`/`NodeError`.
#[derive(Error, Debug)]
pub enum BehaviorTreeError {
    #[error(transparent)]
    Logic(#[from] LogicError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<NodeError> for BehaviorTreeError {
    fn from(value: NodeError) -> Self {
        match value {
            NodeError::IndexError
            | NodeError::PortError(_)
            | NodeError::StatusError(..)
            | NodeError::ChildMissing => BehaviorTreeError::Logic(LogicError::Node(value)),
            other => BehaviorTreeError::Runtime(RuntimeError::Node(other)),
        }
    }
}

/// Parsing/loading a tree definition is always a "the tree was built wrong"
/// problem, per `LogicError`'s framing.
impl From<ParseError> for BehaviorTreeError {
    fn from(value: ParseError) -> Self {
        BehaviorTreeError::Logic(LogicError::InvalidTree(value.to_string()))
    }
}

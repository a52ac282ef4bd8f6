extern crate self as ethology;

pub use anyhow;

pub mod basic_types;
pub mod blackboard;
pub mod error;

pub mod nodes;

pub mod macros;
pub mod observer;
pub mod plugin;
pub mod tree;
pub mod wakeup;
pub mod xml_loader;

pub mod derive {
    pub use ethology_derive::*;
}

// Re-exports for convenience
pub use blackboard::Blackboard;
pub use derive::bt_node;
pub use error::{BehaviorTreeError, LogicError, NodeError, RuntimeError};
pub use tree::Tree;
pub use xml_loader::{Factory, ParseError};

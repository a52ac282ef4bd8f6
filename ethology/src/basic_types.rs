use std::{any::Any, collections::HashMap, convert::Infallible, fmt::Debug};

use thiserror::Error;

use crate::{
    macros::{impl_into_string, impl_string_into},
    nodes::PortClone,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Undefined,
    Action,
    Condition,
    Control,
    Decorator,
    SubTree,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Undefined => "Undefined",
            Self::Action => "Action",
            Self::Condition => "Condition",
            Self::Control => "Control",
            Self::Decorator => "Decorator",
            Self::SubTree => "SubTree",
        };

        write!(f, "{text}")
    }
}

/// The four real states of a tick plus the virtual `Skipped` value used by
/// precondition gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Idle,
    Running,
    Success,
    Failure,
    Skipped,
}

impl NodeStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Skipped)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    pub fn into_string_color(&self) -> String {
        let color_start = match self {
            Self::Idle => "\x1b[36m",
            Self::Running => "\x1b[33m",
            Self::Success => "\x1b[32m",
            Self::Failure => "\x1b[31m",
            Self::Skipped => "\x1b[34m",
        };

        format!("{color_start}{}\x1b[0m", self.bt_to_string())
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Skipped => "SKIPPED",
        };

        write!(f, "{text}")
    }
}

#[derive(Error, Debug)]
pub enum ParseNodeStatusError {
    #[error("string didn't match any NodeStatus values")]
    NoMatch,
}

#[derive(Error, Debug)]
pub enum ParseNodeTypeError {
    #[error("string didn't match any NodeType values")]
    NoMatch,
}

#[derive(Error, Debug)]
pub enum ParsePortDirectionError {
    #[error("string didn't match any PortDirection values")]
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    InOut,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Input => "Input",
            Self::Output => "Output",
            Self::InOut => "InOut",
        };

        write!(f, "{text}")
    }
}

// ===========================
// Converting string to types
// ===========================

/// Converts a raw XML attribute string into a typed port value.
///
/// Implemented out of the box for numeric types, `bool`, `NodeStatus`,
/// `NodeType`, `PortDirection`, and `Vec`s holding those. A custom type can
/// implement `FromStr` and then call `impl_string_into!` to participate in
/// port parsing.
pub trait StringInto<T> {
    type Err;

    fn string_into(&self) -> Result<T, Self::Err>;
}

impl_string_into!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl StringInto<String> for String {
    type Err = Infallible;

    fn string_into(&self) -> Result<String, Self::Err> {
        Ok(self.clone())
    }
}

impl<T> StringInto<Vec<String>> for T
where
    T: AsRef<str>,
{
    type Err = Infallible;

    fn string_into(&self) -> Result<Vec<String>, Self::Err> {
        self.as_ref().split(';').map(|x| Ok(x.to_string())).collect()
    }
}

#[derive(Error, Debug)]
pub enum ParseBoolError {
    #[error("string wasn't one of the expected: 1/0, true/false, TRUE/FALSE")]
    ParseError,
}

impl<T> StringInto<bool> for T
where
    T: AsRef<str>,
{
    type Err = ParseBoolError;

    fn string_into(&self) -> Result<bool, Self::Err> {
        match self.as_ref() {
            "1" | "true" | "TRUE" => Ok(true),
            "0" | "false" | "FALSE" => Ok(false),
            _ => Err(ParseBoolError::ParseError),
        }
    }
}

impl<T> StringInto<NodeStatus> for T
where
    T: AsRef<str>,
{
    type Err = ParseNodeStatusError;

    fn string_into(&self) -> Result<NodeStatus, Self::Err> {
        match self.as_ref() {
            "IDLE" => Ok(NodeStatus::Idle),
            "RUNNING" => Ok(NodeStatus::Running),
            "SUCCESS" => Ok(NodeStatus::Success),
            "FAILURE" => Ok(NodeStatus::Failure),
            "SKIPPED" => Ok(NodeStatus::Skipped),
            _ => Err(ParseNodeStatusError::NoMatch),
        }
    }
}

impl<T> StringInto<NodeType> for T
where
    T: AsRef<str>,
{
    type Err = ParseNodeTypeError;

    fn string_into(&self) -> Result<NodeType, Self::Err> {
        match self.as_ref() {
            "Undefined" => Ok(NodeType::Undefined),
            "Action" => Ok(NodeType::Action),
            "Condition" => Ok(NodeType::Condition),
            "Control" => Ok(NodeType::Control),
            "Decorator" => Ok(NodeType::Decorator),
            "SubTree" => Ok(NodeType::SubTree),
            _ => Err(ParseNodeTypeError::NoMatch),
        }
    }
}

impl<T> StringInto<PortDirection> for T
where
    T: AsRef<str>,
{
    type Err = ParsePortDirectionError;

    fn string_into(&self) -> Result<PortDirection, Self::Err> {
        match self.as_ref() {
            "Input" | "INPUT" => Ok(PortDirection::Input),
            "Output" | "OUTPUT" => Ok(PortDirection::Output),
            "InOut" | "INOUT" => Ok(PortDirection::InOut),
            _ => Err(ParsePortDirectionError::NoMatch),
        }
    }
}

pub trait BTToString {
    fn bt_to_string(&self) -> String;
}

impl BTToString for String {
    fn bt_to_string(&self) -> String {
        self.clone()
    }
}

impl_into_string!(
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    bool,
    NodeStatus,
    NodeType,
    PortDirection,
    serde_json::Value,
    &str
);

// ===========================
// End of string conversions
// ===========================

pub type PortsList = HashMap<String, PortInfo>;
pub type PortsRemapping = HashMap<String, String>;

#[derive(Clone, Debug)]
pub struct TreeNodeManifest {
    pub node_type: NodeType,
    pub registration_id: String,
    pub ports: PortsList,
    pub description: String,
}

pub trait PortValue: Any + PortClone + Debug + BTToString {}

impl<T> PortValue for T where T: Any + PortClone + Debug + BTToString {}

#[derive(Clone, Debug)]
pub struct PortInfo {
    direction: PortDirection,
    description: String,
    default_value: Option<Box<dyn PortValue>>,
}

impl PortInfo {
    pub fn new(direction: PortDirection) -> PortInfo {
        Self {
            direction,
            description: String::new(),
            default_value: None,
        }
    }

    pub fn default_value(&self) -> Option<&Box<dyn PortValue>> {
        self.default_value.as_ref()
    }

    pub fn default_value_str(&self) -> Option<String> {
        self.default_value.as_ref().map(|v| v.bt_to_string())
    }

    pub fn set_default(&mut self, default: impl PortValue) {
        self.default_value = Some(Box::new(default));
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub fn direction(&self) -> &PortDirection {
        &self.direction
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for a single `PortsList` entry, used inside `provided_ports()`.
pub struct Port(String, PortInfo);

impl Port {
    fn create(direction: PortDirection, name: &str, description: &str) -> Port {
        let mut info = PortInfo::new(direction);
        info.set_description(description.to_string());

        Port(name.to_string(), info)
    }

    pub fn default(mut self, default: impl PortValue) -> Port {
        self.1.set_default(default);
        self
    }

    pub fn input(name: &str) -> Port {
        Self::input_description(name, "")
    }

    pub fn input_description(name: &str, description: &str) -> Port {
        Self::create(PortDirection::Input, name, description)
    }

    pub fn output(name: &str) -> Port {
        Self::output_description(name, "")
    }

    pub fn output_description(name: &str, description: &str) -> Port {
        Self::create(PortDirection::Output, name, description)
    }

    pub fn into_pair(self) -> (String, PortInfo) {
        (self.0, self.1)
    }
}

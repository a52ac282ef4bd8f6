//! Parses the `<root>`/`<BehaviorTree>`/`<TreeNodesModel>` XML dialect into
//! a `Tree`, and hosts the `Factory` that owns node-type registration
//! (builtins, plugins, and whatever a caller registers by hand).

use std::{
    collections::{HashMap, HashSet},
    io::Cursor,
    rc::Rc,
    string::FromUtf8Error,
};

use log::{debug, info};
use quick_xml::{
    events::{attributes::Attributes, Event},
    Reader,
};
use thiserror::Error;

use crate::{
    basic_types::{NodeType, PortDirection, PortsList, TreeNodeManifest},
    blackboard::{Blackboard, BlackboardPtr, BlackboardString, RemapMode},
    error::BehaviorTreeError,
    nodes::{
        self, control, decorator, ActionNode, ActionNodeBase, ControlNode, ControlNodeBase, DecoratorNode,
        DecoratorNodeBase, GetNodeType, NodeConfig, TreeNode, TreeNodeBase, TreeNodeDefaults, TreeNodePtr,
    },
    tree::Tree,
    wakeup::WakeupSignal,
};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("port [{0}] on node [{1}] is not in its port list: {2:?}")]
    InvalidPort(String, String, Vec<String>),
    #[error("error parsing XML attribute: {0}")]
    AttrError(#[from] quick_xml::events::attributes::AttrError),
    #[error("error parsing XML: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("expected a <root> start tag")]
    MissingRoot,
    #[error("expected <{0}>, found a different tag")]
    ExpectedRoot(String),
    #[error("reached end of XML unexpectedly")]
    UnexpectedEof,
    #[error("error parsing XML text as UTF-8: {0}")]
    Utf8Error(#[from] FromUtf8Error),
    #[error("node registration id [{0}] is unknown to the factory")]
    UnknownNode(String),
    #[error("internal loader error: {0}")]
    InternalError(String),
    #[error("missing required attribute: {0}")]
    MissingAttribute(String),
    #[error("unknown tree id: {0}")]
    UnknownTree(String),
    #[error("node [{0}] had an invalid combination of children for its kind")]
    NodeTypeMismatch(String),
    #[error("no main tree was specified and the document defines more than one")]
    NoMainTree,
    #[error("<SubTree> instantiation of [{0}] would recurse into itself")]
    CyclicSubtree(String),
    #[error("<TreeNodesModel> contains a <SubTree> entry with no ID attribute")]
    ModelSubtreeMissingId,
    #[error("node id [{0}] is already registered")]
    DuplicateRegistration(String),
}

/// A registered node-type prototype, cloned and specialized per XML
/// instantiation.
#[derive(Debug)]
pub enum NodePtrType {
    Control(Box<dyn ControlNodeBase>),
    Decorator(Box<dyn DecoratorNodeBase>),
    Action(Box<dyn ActionNodeBase>),
}

impl NodePtrType {
    fn manifest(&self) -> Rc<TreeNodeManifest> {
        match self {
            NodePtrType::Control(n) => manifest_of(n.as_ref()),
            NodePtrType::Decorator(n) => manifest_of(n.as_ref()),
            NodePtrType::Action(n) => manifest_of(n.as_ref()),
        }
    }
}

fn manifest_of<T: TreeNode + GetNodeType + ?Sized>(node: &T) -> Rc<TreeNodeManifest> {
    Rc::new(TreeNodeManifest {
        node_type: node.node_type(),
        registration_id: String::new(),
        ports: node.provided_ports(),
        description: String::new(),
    })
}

fn attrs_to_map(attributes: Attributes) -> Result<HashMap<String, String>, ParseError> {
    let mut map = HashMap::new();

    for attr in attributes {
        let attr = attr?;
        let key = String::from_utf8(attr.key.0.to_vec())?;
        let value = String::from_utf8(attr.value.to_vec())?;
        map.insert(key, value);
    }

    Ok(map)
}

pub struct Factory {
    node_map: HashMap<String, NodePtrType>,
    blackboard: BlackboardPtr,
    wakeup: WakeupSignal,
    tree_sources: HashMap<String, Reader<Cursor<Vec<u8>>>>,
    main_tree_id: Option<String>,
}

impl Factory {
    pub fn new() -> Factory {
        let blackboard = Blackboard::new_ptr();
        let wakeup = WakeupSignal::new();

        Self {
            node_map: builtin_nodes(&blackboard, &wakeup),
            blackboard,
            wakeup,
            tree_sources: HashMap::new(),
            main_tree_id: None,
        }
    }

    pub fn blackboard(&self) -> BlackboardPtr {
        Rc::clone(&self.blackboard)
    }

    /// The signal every tree instantiated by this factory sleeps on between
    /// ticks, and that threaded actions' workers wake on completion.
    pub fn wakeup(&self) -> WakeupSignal {
        self.wakeup.clone()
    }

    /// Registers a node type under `id`. Errors if `id` is already taken —
    /// plugins are expected to bring new ids, not shadow existing ones.
    pub fn register_node(&mut self, id: impl Into<String>, node: NodePtrType) -> Result<(), ParseError> {
        let id = id.into();

        if self.node_map.contains_key(&id) {
            return Err(ParseError::DuplicateRegistration(id));
        }

        self.node_map.insert(id, node);
        Ok(())
    }

    /// The ids currently known to the factory, for plugin-load diffing.
    pub fn registered_ids(&self) -> HashSet<String> {
        self.node_map.keys().cloned().collect()
    }

    pub fn node_manifest(&self, id: &str) -> Option<Rc<TreeNodeManifest>> {
        self.node_map.get(id).map(NodePtrType::manifest)
    }

    fn get_node(&self, name: &str) -> Result<&NodePtrType, ParseError> {
        self.node_map.get(name).ok_or_else(|| ParseError::UnknownNode(name.to_string()))
    }

    pub fn create_tree_from_text(&mut self, text: &str, blackboard: BlackboardPtr) -> Result<Tree, BehaviorTreeError> {
        self.register_bt_from_text(text)?;

        let main_tree_id = if let Some(id) = &self.main_tree_id {
            id.clone()
        } else if self.tree_sources.len() == 1 {
            self.tree_sources.keys().next().unwrap().clone()
        } else {
            return Err(ParseError::NoMainTree.into());
        };

        Ok(self.instantiate_tree(&blackboard, &main_tree_id)?)
    }

    pub fn instantiate_tree(&self, blackboard: &BlackboardPtr, main_tree_id: &str) -> Result<Tree, ParseError> {
        let mut visited = HashSet::new();
        let root = self.recursively_build_subtree(main_tree_id, blackboard, &mut visited)?;

        Ok(Tree::new(root, self.wakeup.clone()))
    }

    fn recursively_build_subtree(
        &self,
        tree_id: &str,
        blackboard: &BlackboardPtr,
        visited: &mut HashSet<String>,
    ) -> Result<TreeNodePtr, ParseError> {
        if !visited.insert(tree_id.to_string()) {
            return Err(ParseError::CyclicSubtree(tree_id.to_string()));
        }

        let mut reader = self
            .tree_sources
            .get(tree_id)
            .ok_or_else(|| ParseError::UnknownTree(tree_id.to_string()))?
            .clone();

        let result = match self.build_child(&mut reader, blackboard, visited)? {
            Some(child) => Ok(child),
            None => Err(ParseError::NodeTypeMismatch(tree_id.to_string())),
        };

        visited.remove(tree_id);
        result
    }

    fn build_children(
        &self,
        reader: &mut Reader<Cursor<Vec<u8>>>,
        blackboard: &BlackboardPtr,
        visited: &mut HashSet<String>,
    ) -> Result<Vec<TreeNodePtr>, ParseError> {
        let mut nodes = Vec::new();

        while let Some(node) = self.build_child(reader, blackboard, visited)? {
            nodes.push(node);
        }

        Ok(nodes)
    }

    fn add_ports_to_node(
        &self,
        node_ptr: &TreeNodePtr,
        node_name: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<(), ParseError> {
        let mut node = node_ptr.borrow_mut();
        let config = node.config();
        let manifest = config.manifest().map_err(|_| ParseError::InternalError(format!("node [{node_name}] has no manifest")))?;

        for port_name in attributes.keys() {
            if port_name == "name" || port_name.starts_with('_') {
                continue;
            }

            if !manifest.ports.contains_key(port_name) {
                return Err(ParseError::InvalidPort(
                    port_name.clone(),
                    node_name.to_owned(),
                    manifest.ports.keys().cloned().collect(),
                ));
            }
        }

        for (port_name, port_info) in manifest.ports.iter() {
            let direction = port_info.direction();
            let value = attributes.get(port_name).cloned().unwrap_or_default();

            if attributes.contains_key(port_name) || (!matches!(direction, PortDirection::Output) && port_info.default_value().is_some()) {
                config.add_port(direction.clone(), port_name.clone(), value);
            }
        }

        Ok(())
    }

    fn build_leaf_node(
        &self,
        node_name: &str,
        attributes: &HashMap<String, String>,
        blackboard: &BlackboardPtr,
    ) -> Result<TreeNodePtr, ParseError> {
        let node_ref = self.get_node(node_name)?;

        let mut node = match node_ref {
            NodePtrType::Action(node) => node.clone(),
            x => return Err(ParseError::NodeTypeMismatch(format!("{node_name} ({x:?}) cannot be used as a leaf"))),
        };

        node.config().blackboard = Rc::clone(blackboard);
        node.config().wakeup = self.wakeup.clone();

        let node = node.to_tree_node_ptr();
        self.add_ports_to_node(&node, node_name, attributes)?;

        Ok(node)
    }

    fn build_subtree_node(
        &self,
        attributes: &HashMap<String, String>,
        blackboard: &BlackboardPtr,
        visited: &mut HashSet<String>,
    ) -> Result<TreeNodePtr, ParseError> {
        let id = attributes.get("ID").ok_or_else(|| ParseError::MissingAttribute("SubTree ID".to_string()))?.clone();
        let autoremap = attributes.get("_autoremap").map(|v| v == "true").unwrap_or(false);

        let mut remap = HashMap::new();
        for (key, value) in attributes.iter() {
            if key == "ID" || key == "_autoremap" || key == "name" {
                continue;
            }

            let mode = match value.strip_bb_pointer() {
                Some(inner) if inner.starts_with('_') => RemapMode::Private,
                Some(inner) if inner == "=" => RemapMode::Remapped(key.clone()),
                Some(inner) => RemapMode::Remapped(inner),
                None => RemapMode::Internal,
            };

            remap.insert(key.clone(), mode);
        }

        let child_blackboard = Blackboard::child_with_remap(blackboard, remap);

        for (key, value) in attributes.iter() {
            if key == "ID" || key == "_autoremap" || key == "name" || value.is_bb_pointer() {
                continue;
            }
            child_blackboard.borrow_mut().write(key, value.clone());
        }

        let root = self.recursively_build_subtree(&id, &child_blackboard, visited)?;

        if autoremap {
            let manifest = root.borrow_mut().config().manifest().ok();
            if let Some(manifest) = manifest {
                for port_name in manifest.ports.keys() {
                    if !attributes.contains_key(port_name) {
                        child_blackboard.borrow_mut().add_remap(port_name.clone(), RemapMode::Remapped(port_name.clone()));
                    }
                }
            }
        }

        Ok(root)
    }

    fn build_child(
        &self,
        reader: &mut Reader<Cursor<Vec<u8>>>,
        blackboard: &BlackboardPtr,
        visited: &mut HashSet<String>,
    ) -> Result<Option<TreeNodePtr>, ParseError> {
        let mut buf = Vec::new();

        let node = match reader.read_event_into(&mut buf)? {
            Event::Eof => {
                debug!("unexpected EOF building tree");
                return Err(ParseError::UnexpectedEof);
            }
            Event::Start(e) => {
                let node_name = String::from_utf8(e.name().0.into())?;
                let attributes = attrs_to_map(e.attributes())?;

                debug!("build_child Start: {node_name}");

                if node_name == "SubTree" {
                    Some(self.build_subtree_node(&attributes, blackboard, visited)?)
                } else {
                    let node_ref = self.get_node(&node_name)?;

                    let node = match node_ref {
                        NodePtrType::Control(node) => {
                            let mut node = node.clone();
                            node.config().blackboard = Rc::clone(blackboard);
                            node.config().wakeup = self.wakeup.clone();

                            let children = self.build_children(reader, blackboard, visited)?;

                            for child in children {
                                node.add_child(child);
                            }

                            let node = node.to_tree_node_ptr();
                            self.add_ports_to_node(&node, &node_name, &attributes)?;
                            node
                        }
                        NodePtrType::Decorator(node) => {
                            let mut node = node.clone();
                            node.config().blackboard = Rc::clone(blackboard);
                            node.config().wakeup = self.wakeup.clone();

                            let child = self
                                .build_child(reader, blackboard, visited)?
                                .ok_or_else(|| ParseError::NodeTypeMismatch(format!("{node_name} requires one child")))?;

                            node.set_child(child);

                            let node = node.to_tree_node_ptr();
                            self.add_ports_to_node(&node, &node_name, &attributes)?;
                            node
                        }
                        NodePtrType::Action(_) => self.build_leaf_node(&node_name, &attributes, blackboard)?,
                    };

                    Some(node)
                }
            }
            Event::Empty(e) => {
                let node_name = String::from_utf8(e.name().0.into())?;
                let attributes = attrs_to_map(e.attributes())?;

                debug!("build_child [leaf]: {node_name}");

                let node = if node_name == "SubTree" {
                    self.build_subtree_node(&attributes, blackboard, visited)?
                } else {
                    match self.get_node(&node_name)? {
                        NodePtrType::Action(_) => self.build_leaf_node(&node_name, &attributes, blackboard)?,
                        NodePtrType::Control(_) | NodePtrType::Decorator(_) => {
                            return Err(ParseError::NodeTypeMismatch(format!("{node_name} cannot be a leaf")))
                        }
                    }
                };

                Some(node)
            }
            Event::End(_) => None,
            e => {
                debug!("unexpected XML event: {e:?}");
                return Err(ParseError::InternalError("unexpected XML event while building a subtree".to_string()));
            }
        };

        Ok(node)
    }

    /// Validates `<TreeNodesModel>` (if present): every `<SubTree>` entry
    /// must carry an `ID`, matching test BUG-7's "missing SubTree ID"
    /// scenario.
    fn validate_tree_nodes_model(&self, reader: &mut Reader<Cursor<Vec<u8>>>) -> Result<(), ParseError> {
        let mut buf = Vec::new();
        let mut depth = 1usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => return Err(ParseError::UnexpectedEof),
                Event::Empty(e) => {
                    let name = String::from_utf8(e.name().0.into())?;
                    if name == "SubTree" {
                        let attrs = attrs_to_map(e.attributes())?;
                        if !attrs.contains_key("ID") {
                            return Err(ParseError::ModelSubtreeMissingId);
                        }
                    }
                }
                Event::Start(e) => {
                    let name = String::from_utf8(e.name().0.into())?;
                    if name == "SubTree" {
                        let attrs = attrs_to_map(e.attributes())?;
                        if !attrs.contains_key("ID") {
                            return Err(ParseError::ModelSubtreeMissingId);
                        }
                    }

                    let end = e.to_end().into_owned();
                    reader.read_to_end_into(end.name(), &mut Vec::new())?;
                }
                Event::End(e) => {
                    let name = String::from_utf8(e.name().0.into())?;
                    if name == "TreeNodesModel" {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(());
                        }
                    }
                }
                _ => {}
            }

            buf.clear();
        }
    }

    pub fn register_bt_from_text(&mut self, xml: &str) -> Result<(), ParseError> {
        let mut reader = Reader::from_reader(Cursor::new(xml.as_bytes().to_vec()));
        reader.trim_text(true);

        let mut buf = Vec::new();

        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8(e.name().0.into())?;
                let attributes = attrs_to_map(e.attributes())?;

                if name != "root" {
                    return Err(ParseError::ExpectedRoot(name));
                }

                if let Some(tree_id) = attributes.get("main_tree_to_execute") {
                    info!("main tree id declared: {tree_id}");
                    self.main_tree_id = Some(tree_id.clone());
                }
            }
            _ => return Err(ParseError::MissingRoot),
        }

        buf.clear();

        loop {
            let event = reader.read_event_into(&mut buf)?;

            match event {
                Event::Start(e) => {
                    let name = String::from_utf8(e.name().0.into())?;

                    if name == "TreeNodesModel" {
                        self.validate_tree_nodes_model(&mut reader)?;
                        buf.clear();
                        continue;
                    }

                    if name != "BehaviorTree" {
                        return Err(ParseError::ExpectedRoot(name));
                    }

                    let attributes = attrs_to_map(e.attributes())?;

                    let id = attributes
                        .get("ID")
                        .ok_or_else(|| ParseError::MissingAttribute("BehaviorTree ID".to_string()))?
                        .clone();

                    self.tree_sources.insert(id, reader.clone());

                    let end = e.to_end().into_owned();
                    reader.read_to_end_into(end.name(), &mut buf)?;
                }
                Event::End(e) => {
                    let name = String::from_utf8(e.name().0.into())?;
                    if name != "root" {
                        return Err(ParseError::InternalError("unbalanced closing tag at document root".to_string()));
                    }
                    break;
                }
                Event::Eof => return Err(ParseError::UnexpectedEof),
                _ => {}
            };

            buf.clear();
        }

        Ok(())
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

fn control_entry<T>(id: &str, blackboard: &BlackboardPtr, wakeup: &WakeupSignal) -> (String, NodePtrType)
where
    T: ControlNodeBase + 'static + ControlEntryNew,
{
    let node = Box::new(<T as ControlEntryNew>::new(NodeConfig::new(Rc::clone(blackboard), wakeup.clone())));
    (id.to_string(), NodePtrType::Control(node))
}

// `bt_node`-generated structs all carry a `new(config) -> Self` inherent
// constructor; this trait lets `control_entry`/`decorator_entry`/
// `action_entry` call it generically without naming each struct by hand.
trait ControlEntryNew {
    fn new(config: NodeConfig) -> Self;
}
trait DecoratorEntryNew {
    fn new(config: NodeConfig) -> Self;
}
trait ActionEntryNew {
    fn new(config: NodeConfig) -> Self;
}

macro_rules! impl_entry_new {
    ($trait_name:ident, $($ty:ty),* $(,)?) => {
        $(
            impl $trait_name for $ty {
                fn new(config: NodeConfig) -> Self {
                    <$ty>::new(config)
                }
            }
        )*
    };
}

impl_entry_new!(
    ControlEntryNew,
    control::Sequence,
    control::SequenceWithMemory,
    control::Fallback,
    control::FallbackWithMemory,
    control::ReactiveSequence,
    control::ReactiveFallback,
    control::Parallel,
    control::IfThenElse,
    control::WhileDoElse,
);

impl_entry_new!(
    DecoratorEntryNew,
    decorator::Inverter,
    decorator::ForceSuccess,
    decorator::ForceFailure,
    decorator::Repeat,
    decorator::RetryUntilSuccessful,
    decorator::KeepRunningUntilFailure,
    decorator::RunOnce,
    decorator::Timeout,
    decorator::Delay,
);

impl_entry_new!(
    ActionEntryNew,
    nodes::AlwaysSuccess,
    nodes::AlwaysFailure,
    nodes::SetBlackboard,
);

fn decorator_entry<T>(id: &str, blackboard: &BlackboardPtr, wakeup: &WakeupSignal) -> (String, NodePtrType)
where
    T: DecoratorNodeBase + 'static + DecoratorEntryNew,
{
    let node = Box::new(<T as DecoratorEntryNew>::new(NodeConfig::new(Rc::clone(blackboard), wakeup.clone())));
    (id.to_string(), NodePtrType::Decorator(node))
}

fn action_entry<T>(id: &str, blackboard: &BlackboardPtr, wakeup: &WakeupSignal) -> (String, NodePtrType)
where
    T: ActionNodeBase + 'static + ActionEntryNew,
{
    let node = Box::new(<T as ActionEntryNew>::new(NodeConfig::new(Rc::clone(blackboard), wakeup.clone())));
    (id.to_string(), NodePtrType::Action(node))
}

fn builtin_nodes(blackboard: &BlackboardPtr, wakeup: &WakeupSignal) -> HashMap<String, NodePtrType> {
    let mut map = HashMap::new();

    map.extend([
        control_entry::<control::Sequence>("Sequence", blackboard, wakeup),
        control_entry::<control::SequenceWithMemory>("SequenceWithMemory", blackboard, wakeup),
        control_entry::<control::Fallback>("Fallback", blackboard, wakeup),
        control_entry::<control::FallbackWithMemory>("FallbackWithMemory", blackboard, wakeup),
        control_entry::<control::ReactiveSequence>("ReactiveSequence", blackboard, wakeup),
        control_entry::<control::ReactiveFallback>("ReactiveFallback", blackboard, wakeup),
        control_entry::<control::Parallel>("Parallel", blackboard, wakeup),
        control_entry::<control::IfThenElse>("IfThenElse", blackboard, wakeup),
        control_entry::<control::WhileDoElse>("WhileDoElse", blackboard, wakeup),
    ]);

    map.extend([
        decorator_entry::<decorator::Inverter>("Inverter", blackboard, wakeup),
        decorator_entry::<decorator::ForceSuccess>("ForceSuccess", blackboard, wakeup),
        decorator_entry::<decorator::ForceFailure>("ForceFailure", blackboard, wakeup),
        decorator_entry::<decorator::Repeat>("Repeat", blackboard, wakeup),
        decorator_entry::<decorator::RetryUntilSuccessful>("RetryUntilSuccessful", blackboard, wakeup),
        decorator_entry::<decorator::KeepRunningUntilFailure>("KeepRunningUntilFailure", blackboard, wakeup),
        decorator_entry::<decorator::RunOnce>("RunOnce", blackboard, wakeup),
        decorator_entry::<decorator::Timeout>("Timeout", blackboard, wakeup),
        decorator_entry::<decorator::Delay>("Delay", blackboard, wakeup),
    ]);

    map.extend([
        action_entry::<nodes::AlwaysSuccess>("AlwaysSuccess", blackboard, wakeup),
        action_entry::<nodes::AlwaysFailure>("AlwaysFailure", blackboard, wakeup),
        action_entry::<nodes::SetBlackboard>("SetBlackboard", blackboard, wakeup),
    ]);

    for (id, entry) in map.iter_mut() {
        let manifest = Rc::new(TreeNodeManifest {
            node_type: manifest_node_type(entry),
            registration_id: id.clone(),
            ports: manifest_ports(entry),
            description: String::new(),
        });

        match entry {
            NodePtrType::Control(n) => n.config().set_manifest(manifest),
            NodePtrType::Decorator(n) => n.config().set_manifest(manifest),
            NodePtrType::Action(n) => n.config().set_manifest(manifest),
        };
    }

    map
}

fn manifest_node_type(entry: &NodePtrType) -> NodeType {
    match entry {
        NodePtrType::Control(n) => n.node_type(),
        NodePtrType::Decorator(n) => n.node_type(),
        NodePtrType::Action(n) => n.node_type(),
    }
}

fn manifest_ports(entry: &NodePtrType) -> PortsList {
    match entry {
        NodePtrType::Control(n) => n.provided_ports(),
        NodePtrType::Decorator(n) => n.provided_ports(),
        NodePtrType::Action(n) => n.provided_ports(),
    }
}

use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    fmt::Debug,
    rc::Rc,
};

use log::debug;

use crate::error::NodeError;

pub type BlackboardPtr = Rc<RefCell<Blackboard>>;

/// `strip_bb_pointer`/`is_bb_pointer` for any string-like port attribute,
/// recognizing the `{key}` blackboard-pointer syntax.
pub trait BlackboardString {
    fn strip_bb_pointer(&self) -> Option<String>;
    fn is_bb_pointer(&self) -> bool;
}

impl<T> BlackboardString for T
where
    T: AsRef<str>,
{
    fn strip_bb_pointer(&self) -> Option<String> {
        let s = self.as_ref();

        if s.starts_with('{') && s.ends_with('}') && s.len() >= 2 {
            Some(s[1..s.len() - 1].to_string())
        } else {
            None
        }
    }

    fn is_bb_pointer(&self) -> bool {
        let s = self.as_ref();
        s.starts_with('{') && s.ends_with('}')
    }
}

/// How a local key on a subtree's blackboard is bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemapMode {
    /// Key lives only on this blackboard.
    Internal,
    /// Key is forwarded to `target_key` on the parent blackboard.
    Remapped(String),
    /// Key is private (`_`-prefixed): never exposed through remapping,
    /// even if a remap table entry exists for it.
    Private,
}

struct Entry {
    value: Box<dyn Any>,
    type_id: TypeId,
    type_name: &'static str,
    sequence: u64,
}

impl Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("type_name", &self.type_name)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Metadata about a blackboard entry, for observers/inspection tooling.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub type_name: &'static str,
    pub sequence: u64,
}

/// A typed, scoped key-value store. Each slot records the type of its first
/// write; later writes of a different type are rejected with
/// `NodeError::TypeMismatch`, matching the "no silent type coercion between
/// unrelated types" invariant.
///
/// A blackboard may have a parent (pushed at a `<SubTree>` boundary) and a
/// remap table translating local key names to parent key names. Keys
/// prefixed with `_` are always private and never consulted in the remap
/// table, regardless of what the table says.
#[derive(Debug)]
pub struct Blackboard {
    entries: HashMap<String, Entry>,
    remap: HashMap<String, RemapMode>,
    parent: Option<BlackboardPtr>,
    sequence_counter: u64,
}

impl Blackboard {
    pub fn new() -> Blackboard {
        Self {
            entries: HashMap::new(),
            remap: HashMap::new(),
            parent: None,
            sequence_counter: 0,
        }
    }

    pub fn new_ptr() -> BlackboardPtr {
        Rc::new(RefCell::new(Blackboard::new()))
    }

    /// Create a child blackboard for a subtree instantiation, parented on
    /// `self`, with the given remap table already resolved.
    pub fn child_with_remap(parent: &BlackboardPtr, remap: HashMap<String, RemapMode>) -> BlackboardPtr {
        Rc::new(RefCell::new(Blackboard {
            entries: HashMap::new(),
            remap,
            parent: Some(Rc::clone(parent)),
            sequence_counter: 0,
        }))
    }

    pub fn add_remap(&mut self, local_key: impl Into<String>, mode: RemapMode) {
        self.remap.insert(local_key.into(), mode);
    }

    fn is_private(key: &str) -> bool {
        key.starts_with('_')
    }

    /// Resolve `key` to the blackboard that actually owns the storage and
    /// the key name on that blackboard, following remap chains across
    /// subtree boundaries. Private keys never resolve through a remap.
    fn resolve(&self, key: &str) -> Option<(BlackboardPtr, String)> {
        if Self::is_private(key) {
            return None;
        }

        match self.remap.get(key) {
            Some(RemapMode::Remapped(target)) => {
                let parent = self.parent.as_ref()?;
                let resolved = parent.borrow().resolve(target);
                resolved.or_else(|| Some((Rc::clone(parent), target.clone())))
            }
            Some(RemapMode::Private) | Some(RemapMode::Internal) | None => None,
        }
    }

    pub fn write<T>(&mut self, key: &str, value: T)
    where
        T: 'static + Clone + Debug,
    {
        if let Some((owner, owner_key)) = self.resolve(key) {
            owner.borrow_mut().write_local(&owner_key, value);
        } else {
            self.write_local(key, value);
        }
    }

    fn write_local<T>(&mut self, key: &str, value: T)
    where
        T: 'static + Clone + Debug,
    {
        self.sequence_counter += 1;
        let sequence = self.sequence_counter;

        self.entries.insert(
            key.to_string(),
            Entry {
                value: Box::new(value),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                sequence,
            },
        );
    }

    pub fn read<T>(&self, key: &str) -> Option<T>
    where
        T: 'static + Clone,
    {
        if let Some((owner, owner_key)) = self.resolve(key) {
            return owner.borrow().read_local(&owner_key);
        }

        self.read_local(key)
    }

    fn read_local<T>(&self, key: &str) -> Option<T>
    where
        T: 'static + Clone,
    {
        let entry = self.entries.get(key)?;

        if entry.type_id != TypeId::of::<T>() {
            debug!(
                "blackboard entry [{key}] holds [{}], not [{}]",
                entry.type_name,
                std::any::type_name::<T>()
            );
            return None;
        }

        entry.value.downcast_ref::<T>().cloned()
    }

    /// Typed `get`, distinguishing "key not present" from "wrong type",
    /// per the blackboard's type-safety invariant.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, NodeError>
    where
        T: 'static + Clone,
    {
        match self.resolve(key) {
            Some((owner, owner_key)) => owner.borrow().get_local(&owner_key),
            None => self.get_local(key),
        }
    }

    fn get_local<T>(&self, key: &str) -> Result<Option<T>, NodeError>
    where
        T: 'static + Clone,
    {
        match self.entries.get(key) {
            None => Ok(None),
            Some(entry) if entry.type_id == TypeId::of::<T>() => Ok(entry.value.downcast_ref::<T>().cloned()),
            Some(_) => Err(NodeError::TypeMismatch(key.to_string())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self.resolve(key) {
            Some((owner, owner_key)) => owner.borrow().entries.contains_key(&owner_key),
            None => self.entries.contains_key(key),
        }
    }

    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        fn local_lookup(bb: &Blackboard, key: &str) -> Option<EntryInfo> {
            bb.entries.get(key).map(|e| EntryInfo {
                type_name: e.type_name,
                sequence: e.sequence,
            })
        }

        match self.resolve(key) {
            Some((owner, owner_key)) => local_lookup(&owner.borrow(), &owner_key),
            None => local_lookup(self, key),
        }
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_same_type() {
        let mut bb = Blackboard::new();
        bb.write("x", 42u32);
        assert_eq!(bb.read::<u32>("x"), Some(42));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let mut bb = Blackboard::new();
        bb.write("x", 42u32);
        let result = bb.get::<String>("x");
        assert!(matches!(result, Err(NodeError::TypeMismatch(_))));
    }

    #[test]
    fn remap_reads_from_parent() {
        let parent = Blackboard::new_ptr();
        parent.borrow_mut().write("vect", String::from("1,2,3,4"));

        let mut remap = HashMap::new();
        remap.insert("value".to_string(), RemapMode::Remapped("vect".to_string()));
        let child = Blackboard::child_with_remap(&parent, remap);

        assert_eq!(child.borrow().read::<String>("value"), Some("1,2,3,4".to_string()));
    }

    #[test]
    fn subtree_isolation_for_non_remapped_keys() {
        let parent = Blackboard::new_ptr();
        let child = Blackboard::child_with_remap(&parent, HashMap::new());

        child.borrow_mut().write("local_only", 7i32);

        assert!(parent.borrow().read::<i32>("local_only").is_none());
    }

    #[test]
    fn private_keys_never_remap() {
        let parent = Blackboard::new_ptr();
        parent.borrow_mut().write("_secret", 1u32);

        let mut remap = HashMap::new();
        remap.insert("_secret".to_string(), RemapMode::Remapped("_secret".to_string()));
        let child = Blackboard::child_with_remap(&parent, remap);

        child.borrow_mut().write("_secret", 99u32);
        assert_eq!(child.borrow().read::<u32>("_secret"), Some(99));
        assert_eq!(parent.borrow().read::<u32>("_secret"), Some(1));
    }
}

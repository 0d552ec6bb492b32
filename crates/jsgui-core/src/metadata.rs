//! Persistent per-position records, stored in a generation-tagged arena.
//!
//! A position is identified by its parent's record plus the child's resolved
//! key. Parent links are ids, so a record removed from the arena leaves no
//! dangling owner: lookups through a stale id return `None`.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::collections::ChildKeyMap;
use crate::component::UnmountCallback;
use crate::dispatch::DispatchKey;
use crate::dom::{DomNodeId, Listener};
use crate::error::RenderError;
use crate::hooks::ValidationState;
use crate::props::InheritedProps;

new_key_type! {
    /// Handle to the persistent record of one tree position.
    pub struct MetadataId;
    /// Handle to a mounted root.
    pub struct RootId;
}

/// The DOM node a position owns, plus what it was created for.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BoundNode {
    pub id: DomNodeId,
    /// `None` for text nodes.
    pub tag: Option<Rc<str>>,
    pub owner: Rc<str>,
    pub dependency: Option<u64>,
}

impl BoundNode {
    pub fn is_element(&self) -> bool {
        self.tag.is_some()
    }
}

pub(crate) struct Metadata {
    pub parent: Option<MetadataId>,
    pub root: RootId,
    pub key: Rc<str>,
    pub bound: Option<BoundNode>,
    pub state: Option<Rc<dyn Any>>,
    pub validation: Option<Rc<RefCell<ValidationState>>>,
    pub applied: InheritedProps,
    pub listeners: indexmap::IndexMap<String, Listener>,
    pub children: ChildKeyMap,
    pub gc_flag: bool,
    pub on_unmount: Option<UnmountCallback>,
    pub indexed_child_count: Option<usize>,
    pub subscriptions: Vec<DispatchKey>,
}

impl Metadata {
    fn new(parent: Option<MetadataId>, root: RootId, key: Rc<str>, gc_flag: bool) -> Self {
        Self {
            parent,
            root,
            key,
            bound: None,
            state: None,
            validation: None,
            applied: InheritedProps::default(),
            listeners: indexmap::IndexMap::new(),
            children: ChildKeyMap::default(),
            gc_flag,
            on_unmount: None,
            indexed_child_count: None,
            subscriptions: Vec::new(),
        }
    }

    /// Drops the diff baselines so the next application is a full one.
    pub fn reset_baselines(&mut self) {
        self.applied = InheritedProps::default();
        self.listeners.clear();
    }

    pub fn subscribe(&mut self, key: DispatchKey) {
        if !self.subscriptions.contains(&key) {
            self.subscriptions.push(key);
        }
    }
}

#[derive(Default)]
pub(crate) struct MetadataStore {
    slots: SlotMap<MetadataId, Metadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_root(&mut self, root: RootId) -> MetadataId {
        self.slots
            .insert(Metadata::new(None, root, Rc::from(""), false))
    }

    pub fn get(&self, id: MetadataId) -> Option<&Metadata> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: MetadataId) -> Option<&mut Metadata> {
        self.slots.get_mut(id)
    }

    pub fn contains(&self, id: MetadataId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Fetches the record for `key` under `parent`, creating it on first sight.
    pub fn child_or_insert(
        &mut self,
        parent: MetadataId,
        key: &Rc<str>,
    ) -> Result<MetadataId, RenderError> {
        let (root, gc_flag, existing) = {
            let meta = self
                .slots
                .get(parent)
                .ok_or(RenderError::StaleMetadata(parent))?;
            (meta.root, meta.gc_flag, meta.children.get(key).copied())
        };
        if let Some(id) = existing.filter(|id| self.slots.contains_key(*id)) {
            return Ok(id);
        }
        let id = self
            .slots
            .insert(Metadata::new(Some(parent), root, Rc::clone(key), gc_flag));
        if let Some(meta) = self.slots.get_mut(parent) {
            meta.children.insert(Rc::clone(key), id);
        }
        Ok(id)
    }

    /// Removes `id` and unlinks it from its parent's key map.
    pub fn remove(&mut self, id: MetadataId) -> Option<Metadata> {
        let meta = self.slots.remove(id)?;
        if let Some(parent) = meta.parent.and_then(|p| self.slots.get_mut(p)) {
            if parent.children.get(&meta.key) == Some(&id) {
                parent.children.remove(&meta.key);
            }
        }
        Some(meta)
    }

    /// `id` followed by every record below it, parents before children.
    pub fn subtree(&self, id: MetadataId) -> Vec<MetadataId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(meta) = self.slots.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(meta.children.values().copied());
        }
        out
    }

    /// Whether the ancestor chain of `id` reaches `root` without a gap.
    pub fn is_reachable(&self, id: MetadataId, root: MetadataId) -> bool {
        let mut current = id;
        loop {
            if current == root {
                return true;
            }
            let Some(meta) = self.slots.get(current) else {
                return false;
            };
            match meta.parent {
                Some(parent) if self.slots.contains_key(parent) => {
                    let parent_meta = &self.slots[parent];
                    if parent_meta.children.get(&meta.key) != Some(&current) {
                        return false;
                    }
                    current = parent;
                }
                _ => return false,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/metadata_tests.rs"]
mod tests;

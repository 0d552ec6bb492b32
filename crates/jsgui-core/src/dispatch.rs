//! Shared subscription points for external change sources.
//!
//! A target is created at most once per [`DispatchKey`] and is never torn
//! down; only its subscriber list shrinks as positions are swept.

use indexmap::IndexMap;

use crate::collections::map;
use crate::host::WindowSize;
use crate::metadata::{MetadataId, RootId};
use crate::props::{kebab_case, StyleValue};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchKey {
    Storage,
    Media(String),
    Location,
    LocationHash,
    WindowResize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Snapshot {
    None,
    Matches(bool),
    Size(WindowSize),
}

pub(crate) struct DispatchTarget {
    subscribers: IndexMap<MetadataId, RootId>,
    snapshot: Snapshot,
}

impl DispatchTarget {
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[derive(Default)]
pub(crate) struct DispatchTargets {
    targets: map::HashMap<DispatchKey, DispatchTarget>,
}

impl DispatchTargets {
    /// Returns the target for `key`, creating it with `init`'s snapshot the first time.
    pub fn init(
        &mut self,
        key: &DispatchKey,
        init: impl FnOnce() -> Snapshot,
    ) -> &mut DispatchTarget {
        self.targets.entry(key.clone()).or_insert_with(|| {
            log::trace!("creating dispatch target {key:?}");
            DispatchTarget {
                subscribers: IndexMap::new(),
                snapshot: init(),
            }
        })
    }

    pub fn get(&self, key: &DispatchKey) -> Option<&DispatchTarget> {
        self.targets.get(key)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn subscribe(
        &mut self,
        key: &DispatchKey,
        init: impl FnOnce() -> Snapshot,
        metadata: MetadataId,
        root: RootId,
    ) -> Snapshot {
        let target = self.init(key, init);
        target.subscribers.insert(metadata, root);
        target.snapshot
    }

    pub fn unsubscribe(&mut self, metadata: MetadataId, keys: &[DispatchKey]) {
        for key in keys {
            if let Some(target) = self.targets.get_mut(key) {
                target.subscribers.shift_remove(&metadata);
            }
        }
    }

    /// Replaces the snapshot if the target exists; returns whether it changed.
    pub fn update_snapshot(&mut self, key: &DispatchKey, snapshot: Snapshot) -> bool {
        match self.targets.get_mut(key) {
            Some(target) if target.snapshot != snapshot => {
                target.snapshot = snapshot;
                true
            }
            _ => false,
        }
    }

    /// Canonical strings of every media query target created so far.
    pub fn media_queries(&self) -> Vec<String> {
        self.targets
            .keys()
            .filter_map(|key| match key {
                DispatchKey::Media(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Distinct roots owning a subscriber of `key`, in subscription order.
    pub fn roots_for(&self, key: &DispatchKey) -> Vec<RootId> {
        let Some(target) = self.targets.get(key) else {
            return Vec::new();
        };
        let mut roots: Vec<RootId> = Vec::new();
        for root in target.subscribers.values() {
            if !roots.contains(root) {
                roots.push(*root);
            }
        }
        roots
    }
}

/// A structured media query, e.g. `MediaQuery::new().feature("maxWidth", 600)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaQuery {
    features: Vec<(String, StyleValue)>,
}

impl MediaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(mut self, name: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.features.push((name.into(), value.into()));
        self
    }

    /// `(max-width: 600px) and (orientation: landscape)`.
    pub fn canonical(&self) -> String {
        self.features
            .iter()
            .map(|(name, value)| format!("({}: {})", kebab_case(name), value.to_css()))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;

//! One reconciliation pass: walk a fresh node tree, patch the DOM to match,
//! then sweep the positions the previous tree had and this one lost.

use std::rc::Rc;

use crate::collections::map::HashSet;
use crate::component::{ComponentNode, Lifecycle};
use crate::context::RenderContext;
use crate::dom::{Dom, DomNodeId};
use crate::error::RenderError;
use crate::metadata::{BoundNode, MetadataId, MetadataStore};
use crate::props::{diff_classes, diff_props, kebab_case, InheritedProps};
use crate::runtime::RuntimeInner;

#[derive(Clone, Copy)]
struct Frame<'i> {
    container: DomNodeId,
    inherited: &'i InheritedProps,
    /// Still directly inside the root container; no element owned above.
    top: bool,
}

pub(crate) struct Reconciler<'r> {
    dom: &'r mut dyn Dom,
    store: &'r mut MetadataStore,
    runtime: &'r Rc<RuntimeInner>,
    cursors: Vec<Option<DomNodeId>>, // FUTURE(no_std): bounded stack sized to tree depth.
    flag: bool,
}

impl<'r> Reconciler<'r> {
    pub fn new(
        dom: &'r mut dyn Dom,
        store: &'r mut MetadataStore,
        runtime: &'r Rc<RuntimeInner>,
        flag: bool,
    ) -> Self {
        Self {
            dom,
            store,
            runtime,
            cursors: Vec::new(),
            flag,
        }
    }

    /// Renders `node` (already bound to the root metadata) into `container`.
    pub fn render_root(
        &mut self,
        node: &mut ComponentNode,
        container: DomNodeId,
    ) -> Result<(), RenderError> {
        let empty = InheritedProps::default();
        self.cursors.clear();
        self.cursors.push(None);
        let result = self.render_node(
            node,
            Frame {
                container,
                inherited: &empty,
                top: true,
            },
        );
        self.cursors.clear();
        result
    }

    fn render_node(&mut self, node: &mut ComponentNode, frame: Frame<'_>) -> Result<(), RenderError> {
        let id = node
            .metadata
            .ok_or_else(|| RenderError::failed(node.name.as_str(), "node has no metadata"))?;
        node.mark_declared();

        let render = Rc::clone(&node.render);
        let (lifecycle, bound) = {
            let meta = self
                .store
                .get_mut(id)
                .ok_or(RenderError::StaleMetadata(id))?;
            let mut cx = RenderContext::new(&mut *self.dom, meta, id, node, self.runtime);
            let lifecycle = render(&mut cx)?;
            (lifecycle, cx.into_bound())
        };
        let name = node.name.clone();

        let mut merged = frame.inherited.merge(&node.base);
        let previous = self
            .store
            .get(id)
            .ok_or(RenderError::StaleMetadata(id))?
            .bound
            .clone();

        let (container, top, child_inherited, owns_element) = match &bound {
            Some(current) => {
                self.place(id, current, previous.as_ref(), frame)?;
                if current.is_element() {
                    if current.tag.as_deref() != Some(name.as_str()) && !name.is_fragment() {
                        merged.class_name.push(name.to_string());
                    }
                    self.apply_props(id, current.id, &merged, node, name.as_str())?;
                    (current.id, false, InheritedProps::default(), true)
                } else {
                    (frame.container, frame.top, merged, false)
                }
            }
            None => {
                if let Some(previous) = previous {
                    log::trace!("`{name}` dropped its node {}", previous.id);
                    self.dom.remove_node(previous.id)?;
                    if let Some(meta) = self.store.get_mut(id) {
                        meta.reset_baselines();
                    }
                }
                if !name.is_fragment() {
                    merged.class_name.push(name.to_string());
                }
                (frame.container, frame.top, merged, false)
            }
        };

        self.render_children(id, node, container, top, &child_inherited, owns_element)?;
        self.finish(id, node, bound, lifecycle)
    }

    /// Inserts or moves `current` so it directly follows the cursor, replacing
    /// the node this position held before if it changed.
    fn place(
        &mut self,
        id: MetadataId,
        current: &BoundNode,
        previous: Option<&BoundNode>,
        frame: Frame<'_>,
    ) -> Result<(), RenderError> {
        let cursor = self.cursors.last().copied().flatten();
        let in_place = match previous {
            Some(previous) if previous.id == current.id => match cursor {
                Some(anchor) => self.dom.next_sibling(anchor) == Some(current.id),
                None if frame.top => self.dom.parent_node(current.id) == Some(frame.container),
                None => self.dom.first_child(frame.container) == Some(current.id),
            },
            Some(previous) => {
                log::trace!("replacing node {} with {}", previous.id, current.id);
                self.dom.remove_node(previous.id)?;
                if let Some(meta) = self.store.get_mut(id) {
                    meta.reset_baselines();
                }
                false
            }
            None => false,
        };
        if !in_place {
            match cursor {
                Some(anchor) => self.dom.insert_after(frame.container, current.id, Some(anchor))?,
                None if frame.top => self.dom.append_child(frame.container, current.id)?,
                None => self.dom.insert_after(frame.container, current.id, None)?,
            }
        }
        if let Some(slot) = self.cursors.last_mut() {
            *slot = Some(current.id);
        }
        Ok(())
    }

    fn apply_props(
        &mut self,
        id: MetadataId,
        element: DomNodeId,
        merged: &InheritedProps,
        node: &ComponentNode,
        name: &str,
    ) -> Result<(), RenderError> {
        let meta = self
            .store
            .get_mut(id)
            .ok_or(RenderError::StaleMetadata(id))?;
        let dom = &mut *self.dom;

        for change in diff_props(&meta.applied.style, &merged.style) {
            match change.new {
                Some(value) => dom.set_style(element, change.key, &value.to_css())?,
                None => dom.remove_style(element, change.key)?,
            }
        }
        for change in diff_props(&meta.applied.css_vars, &merged.css_vars) {
            let property = format!("--{}", change.key);
            match change.new {
                Some(value) => dom.set_style(element, &property, &value.to_css())?,
                None => dom.remove_style(element, &property)?,
            }
        }
        let (removed, added) = diff_classes(&meta.applied.class_name, &merged.class_name);
        for class in removed {
            if is_valid_class(class) {
                dom.remove_class(element, class)?;
            }
        }
        for class in added {
            if class.is_empty() {
                log::warn!("class name cannot be empty in `{name}`: {:?}", merged.class_name);
                continue;
            }
            if class.contains(char::is_whitespace) {
                log::warn!(
                    "class name cannot contain whitespace in `{name}`: {:?}",
                    merged.class_name
                );
                continue;
            }
            dom.add_class(element, class)?;
        }
        for change in diff_props(&meta.applied.attribute, &merged.attribute) {
            let attribute = kebab_case(change.key);
            match change.new.and_then(|value| value.to_attribute()) {
                Some(value) => dom.set_attribute(element, &attribute, &value)?,
                None => dom.remove_attribute(element, &attribute)?,
            }
        }

        let mut listeners = indexmap::IndexMap::new();
        for (event, listener) in &node.base.events {
            if let Some(listener) = listener {
                listeners.insert(event.clone(), listener.clone());
            }
        }
        for (event, old) in &meta.listeners {
            if listeners.get(event) != Some(old) {
                dom.remove_event_listener(element, event, old)?;
            }
        }
        let passive_events = &self.runtime.options.passive_events;
        for (event, listener) in &listeners {
            if meta.listeners.get(event) != Some(listener) {
                let passive = passive_events.iter().any(|passive| passive == event);
                dom.add_event_listener(element, event, listener, passive)?;
            }
        }
        meta.listeners = listeners;
        meta.applied = merged.clone();
        Ok(())
    }

    fn render_children(
        &mut self,
        id: MetadataId,
        node: &mut ComponentNode,
        container: DomNodeId,
        top: bool,
        inherited: &InheritedProps,
        owns_element: bool,
    ) -> Result<(), RenderError> {
        if node.children.is_empty() {
            return Ok(());
        }
        if owns_element {
            self.cursors.push(None);
        }
        let warn_duplicates = self.runtime.options.warn_on_duplicate_keys;
        let mut seen: HashSet<Rc<str>> = HashSet::default();
        let mut result = Ok(());
        for child in node.children.iter_mut() {
            if !seen.insert(Rc::clone(&child.key)) && warn_duplicates {
                log::warn!("duplicate key `{}` under `{}`", child.key, node.name);
                self.runtime.record(|d| d.duplicate_keys += 1);
            }
            let child_id = match self.store.child_or_insert(id, &child.key) {
                Ok(child_id) => child_id,
                Err(err) => {
                    result = Err(err);
                    break;
                }
            };
            if let Some(meta) = self.store.get_mut(child_id) {
                meta.gc_flag = self.flag;
            }
            child.metadata = Some(child_id);
            let frame = Frame {
                container,
                inherited,
                top,
            };
            if let Err(err) = self.render_node(child, frame) {
                result = Err(err);
                break;
            }
        }
        if owns_element {
            self.cursors.pop();
        }
        result
    }

    fn finish(
        &mut self,
        id: MetadataId,
        node: &ComponentNode,
        bound: Option<BoundNode>,
        lifecycle: Lifecycle,
    ) -> Result<(), RenderError> {
        let meta = self
            .store
            .get_mut(id)
            .ok_or(RenderError::StaleMetadata(id))?;
        let indexed = node.indexed_child_count;
        if let Some(previous) = meta.indexed_child_count {
            if previous != indexed && self.runtime.options.warn_on_unkeyed_churn {
                log::warn!(
                    "varying children of `{}` should have a key ({previous} -> {indexed})",
                    node.name
                );
                self.runtime.record(|d| d.unkeyed_churn += 1);
            }
        }
        meta.indexed_child_count = Some(indexed);
        meta.bound = bound;
        let previous_unmount = meta.on_unmount.take();

        let Lifecycle {
            on_mount,
            on_unmount,
        } = lifecycle;
        if let Some(on_mount) = on_mount {
            on_mount(&mut *self.dom);
        }
        if let Some(previous_unmount) = previous_unmount {
            previous_unmount(false);
        }
        if let Some(meta) = self.store.get_mut(id) {
            meta.on_unmount = on_unmount;
        }
        Ok(())
    }

    /// Tears down every position of `previous` whose flag was not restamped
    /// by this pass, along with everything below it.
    pub fn sweep(&mut self, previous: &ComponentNode) {
        for child in &previous.children {
            if let Some(child_id) = child.metadata {
                let stale = self
                    .store
                    .get(child_id)
                    .is_some_and(|meta| meta.gc_flag != self.flag);
                if stale {
                    self.teardown(child_id);
                }
            }
            self.sweep(child);
        }
    }

    /// Removes `id` and its whole metadata subtree: unsubscribes, fires
    /// `on_unmount(true)` once per position, and removes bound nodes.
    pub fn teardown(&mut self, id: MetadataId) {
        let subtree = self.store.subtree(id);
        log::trace!("tearing down {} position(s)", subtree.len());
        for position in subtree {
            let Some(meta) = self.store.remove(position) else {
                continue;
            };
            self.runtime
                .dispatch
                .borrow_mut()
                .unsubscribe(position, &meta.subscriptions);
            if let Some(on_unmount) = meta.on_unmount {
                on_unmount(true);
            }
            if let Some(bound) = meta.bound {
                if let Err(err) = self.dom.remove_node(bound.id) {
                    log::warn!("failed to remove node {}: {err}", bound.id);
                }
            }
        }
    }
}

fn is_valid_class(class: &str) -> bool {
    !class.is_empty() && !class.contains(char::is_whitespace)
}

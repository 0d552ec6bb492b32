//! Host DOM abstraction and an in-memory implementation.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use slotmap::{new_key_type, Key, SlotMap};

use crate::error::DomError;

new_key_type! {
    /// Handle to a host node. Handles of removed nodes never resolve again.
    pub struct DomNodeId;
}

impl fmt::Display for DomNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.data())
    }
}

/// A DOM event as seen by listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: DomNodeId,
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: DomNodeId) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// An event handler. Two listeners are equal only if they are the same allocation.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Listener(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

/// The host document. Every write the reconciler performs goes through here.
pub trait Dom: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn create_element(&mut self, tag: &str) -> DomNodeId;
    fn create_text(&mut self, text: &str) -> DomNodeId;
    fn set_text(&mut self, node: DomNodeId, text: &str) -> Result<(), DomError>;
    /// Lowercase tag name, `None` for text nodes.
    fn tag_name(&self, node: DomNodeId) -> Result<Option<&str>, DomError>;

    fn parent_node(&self, node: DomNodeId) -> Option<DomNodeId>;
    fn first_child(&self, parent: DomNodeId) -> Option<DomNodeId>;
    fn next_sibling(&self, node: DomNodeId) -> Option<DomNodeId>;
    fn append_child(&mut self, parent: DomNodeId, node: DomNodeId) -> Result<(), DomError>;
    /// Moves `node` right after `anchor`, or to the front of `parent` when `anchor` is `None`.
    fn insert_after(
        &mut self,
        parent: DomNodeId,
        node: DomNodeId,
        anchor: Option<DomNodeId>,
    ) -> Result<(), DomError>;
    /// Detaches `node` from its parent; detaching a detached node is a no-op.
    fn detach(&mut self, node: DomNodeId) -> Result<(), DomError>;
    /// Detaches `node` and releases it. Its children are left detached for
    /// their owners to reinsert or remove. Removing a removed node is a no-op.
    fn remove_node(&mut self, node: DomNodeId) -> Result<(), DomError>;

    /// First element at or below `root` whose `id` attribute is `id`.
    fn find_by_id(&self, _root: DomNodeId, _id: &str) -> Option<DomNodeId> {
        None
    }

    fn scroll_into_view(&mut self, _node: DomNodeId) -> Result<(), DomError> {
        Ok(())
    }

    fn set_style(&mut self, node: DomNodeId, property: &str, value: &str) -> Result<(), DomError>;
    fn remove_style(&mut self, node: DomNodeId, property: &str) -> Result<(), DomError>;
    fn add_class(&mut self, node: DomNodeId, class: &str) -> Result<(), DomError>;
    fn remove_class(&mut self, node: DomNodeId, class: &str) -> Result<(), DomError>;
    fn set_attribute(&mut self, node: DomNodeId, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&mut self, node: DomNodeId, name: &str) -> Result<(), DomError>;
    fn add_event_listener(
        &mut self,
        node: DomNodeId,
        event: &str,
        listener: &Listener,
        passive: bool,
    ) -> Result<(), DomError>;
    fn remove_event_listener(
        &mut self,
        node: DomNodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), DomError>;
}

impl dyn Dom {
    pub fn downcast_ref<D: Dom>(&self) -> Option<&D> {
        self.as_any().downcast_ref::<D>()
    }

    pub fn downcast_mut<D: Dom>(&mut self) -> Option<&mut D> {
        self.as_any_mut().downcast_mut::<D>()
    }
}

/// Counts of DOM writes, split by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub styles: usize,
    pub classes: usize,
    pub attributes: usize,
    pub listeners: usize,
    pub texts: usize,
    pub inserts: usize,
    pub detaches: usize,
}

impl MutationStats {
    /// Writes of presentation state: styles, css vars, classes, attributes, listeners.
    pub fn property_writes(&self) -> usize {
        self.styles + self.classes + self.attributes + self.listeners
    }
}

#[derive(Clone, Debug)]
enum MemoryNodeKind {
    Element { tag: String },
    Text { text: String },
}

#[derive(Clone, Debug)]
struct RegisteredListener {
    event: String,
    listener: Listener,
    passive: bool,
}

#[derive(Clone, Debug)]
struct MemoryNode {
    kind: MemoryNodeKind,
    parent: Option<DomNodeId>,
    children: Vec<DomNodeId>,
    styles: IndexMap<String, String>,
    classes: IndexSet<String>,
    attributes: IndexMap<String, String>,
    listeners: Vec<RegisteredListener>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            styles: IndexMap::new(),
            classes: IndexSet::new(),
            attributes: IndexMap::new(),
            listeners: Vec::new(),
        }
    }
}

/// Headless document used by tests, benches and the demo app.
#[derive(Default)]
pub struct MemoryDom {
    nodes: SlotMap<DomNodeId, MemoryNode>,
    stats: MutationStats,
    scrolled: Vec<DomNodeId>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: DomNodeId) -> Result<&MemoryNode, DomError> {
        self.nodes.get(id).ok_or(DomError::Missing { id })
    }

    fn node_mut(&mut self, id: DomNodeId) -> Result<&mut MemoryNode, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::Missing { id })
    }

    fn element_mut(&mut self, id: DomNodeId) -> Result<&mut MemoryNode, DomError> {
        let node = self.node_mut(id)?;
        match node.kind {
            MemoryNodeKind::Element { .. } => Ok(node),
            MemoryNodeKind::Text { .. } => Err(DomError::NotAnElement { id }),
        }
    }

    fn unlink(&mut self, node: DomNodeId) -> Result<bool, DomError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(false);
        };
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|child| *child != node);
        self.node_mut(node)?.parent = None;
        Ok(true)
    }

    fn is_ancestor_or_self(&self, candidate: DomNodeId, node: DomNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    pub fn mutations(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_mutations(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Nodes scrolled into view, oldest first.
    pub fn scrolled_into_view(&self) -> &[DomNodeId] {
        &self.scrolled
    }

    /// Live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, node: DomNodeId) -> Option<DomNodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: DomNodeId) -> &[DomNodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_text(&self, node: DomNodeId) -> bool {
        matches!(
            self.nodes.get(node).map(|n| &n.kind),
            Some(MemoryNodeKind::Text { .. })
        )
    }

    /// Whether `node` is `root` or attached somewhere below it.
    pub fn is_attached_to(&self, node: DomNodeId, root: DomNodeId) -> bool {
        self.is_ancestor_or_self(root, node)
    }

    pub fn text_content(&self, node: DomNodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: DomNodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node) else {
            return;
        };
        match &entry.kind {
            MemoryNodeKind::Text { text } => out.push_str(text),
            MemoryNodeKind::Element { .. } => {
                for child in &entry.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub fn style(&self, node: DomNodeId, property: &str) -> Option<&str> {
        self.nodes
            .get(node)
            .and_then(|n| n.styles.get(property))
            .map(String::as_str)
    }

    pub fn attribute(&self, node: DomNodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn has_class(&self, node: DomNodeId, class: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.classes.contains(class))
    }

    pub fn classes(&self, node: DomNodeId) -> Vec<String> {
        self.nodes
            .get(node)
            .map(|n| n.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, node: DomNodeId, event: &str) -> usize {
        self.nodes
            .get(node)
            .map(|n| n.listeners.iter().filter(|l| l.event == event).count())
            .unwrap_or(0)
    }

    pub fn is_passive(&self, node: DomNodeId, event: &str) -> bool {
        self.nodes.get(node).is_some_and(|n| {
            n.listeners
                .iter()
                .any(|l| l.event == event && l.passive)
        })
    }

    /// Listeners for `event` on `target` and then on each ancestor, in bubbling order.
    pub fn bubbling_listeners(&self, target: DomNodeId, event: &str) -> Vec<Listener> {
        let mut out = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            out.extend(
                node.listeners
                    .iter()
                    .filter(|l| l.event == event)
                    .map(|l| l.listener.clone()),
            );
            current = node.parent;
        }
        out
    }

    /// Depth-first search below `root` (inclusive).
    pub fn find(&self, root: DomNodeId, predicate: impl Fn(DomNodeId) -> bool) -> Option<DomNodeId> {
        self.find_dyn(root, &predicate)
    }

    fn find_dyn(&self, root: DomNodeId, predicate: &dyn Fn(DomNodeId) -> bool) -> Option<DomNodeId> {
        if predicate(root) {
            return Some(root);
        }
        self.children(root)
            .iter()
            .find_map(|child| self.find_dyn(*child, predicate))
    }

    pub fn find_by_class(&self, root: DomNodeId, class: &str) -> Option<DomNodeId> {
        self.find(root, |id| self.has_class(id, class))
    }

    pub fn find_by_tag(&self, root: DomNodeId, tag: &str) -> Option<DomNodeId> {
        self.find(root, |id| {
            matches!(self.nodes.get(id).map(|n| &n.kind), Some(MemoryNodeKind::Element { tag: t }) if t == tag)
        })
    }

    pub fn dump_tree(&self, root: DomNodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: DomNodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            output.push_str(&format!("{indent}[{id}] (missing)\n"));
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text { text } => {
                output.push_str(&format!("{indent}[{id}] {text:?}\n"));
            }
            MemoryNodeKind::Element { tag } => {
                output.push_str(&format!("{indent}[{id}] <{tag}"));
                if !node.classes.is_empty() {
                    let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
                    output.push_str(&format!(" class=\"{}\"", classes.join(" ")));
                }
                for (name, value) in &node.attributes {
                    output.push_str(&format!(" {name}=\"{value}\""));
                }
                if !node.styles.is_empty() {
                    let styles: Vec<String> = node
                        .styles
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect();
                    output.push_str(&format!(" style=\"{}\"", styles.join("; ")));
                }
                output.push_str(">\n");
                for child in &node.children {
                    self.dump_node(output, *child, depth + 1);
                }
            }
        }
    }
}

impl Dom for MemoryDom {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn create_element(&mut self, tag: &str) -> DomNodeId {
        self.nodes.insert(MemoryNode::new(MemoryNodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        }))
    }

    fn create_text(&mut self, text: &str) -> DomNodeId {
        self.nodes.insert(MemoryNode::new(MemoryNodeKind::Text {
            text: text.to_owned(),
        }))
    }

    fn set_text(&mut self, node: DomNodeId, value: &str) -> Result<(), DomError> {
        let entry = self.node_mut(node)?;
        match &mut entry.kind {
            MemoryNodeKind::Text { text } => {
                if text != value {
                    *text = value.to_owned();
                    self.stats.texts += 1;
                }
                Ok(())
            }
            MemoryNodeKind::Element { .. } => {
                if let [only] = entry.children[..] {
                    if let Some(MemoryNodeKind::Text { text }) =
                        self.nodes.get_mut(only).map(|n| &mut n.kind)
                    {
                        if text != value {
                            *text = value.to_owned();
                            self.stats.texts += 1;
                        }
                        return Ok(());
                    }
                }
                let entry = &mut self.nodes[node];
                let children = std::mem::take(&mut entry.children);
                for child in children {
                    if let Some(c) = self.nodes.get_mut(child) {
                        c.parent = None;
                    }
                }
                let text = self.create_text(value);
                self.nodes[text].parent = Some(node);
                self.nodes[node].children.push(text);
                self.stats.texts += 1;
                Ok(())
            }
        }
    }

    fn tag_name(&self, node: DomNodeId) -> Result<Option<&str>, DomError> {
        Ok(match &self.node(node)?.kind {
            MemoryNodeKind::Element { tag } => Some(tag.as_str()),
            MemoryNodeKind::Text { .. } => None,
        })
    }

    fn parent_node(&self, node: DomNodeId) -> Option<DomNodeId> {
        self.parent(node)
    }

    fn first_child(&self, parent: DomNodeId) -> Option<DomNodeId> {
        self.nodes.get(parent).and_then(|n| n.children.first().copied())
    }

    fn next_sibling(&self, node: DomNodeId) -> Option<DomNodeId> {
        let parent = self.nodes.get(node)?.parent?;
        let siblings = &self.nodes.get(parent)?.children;
        let index = siblings.iter().position(|child| *child == node)?;
        siblings.get(index + 1).copied()
    }

    fn append_child(&mut self, parent: DomNodeId, node: DomNodeId) -> Result<(), DomError> {
        self.element_mut(parent)?;
        self.node(node)?;
        if self.is_ancestor_or_self(node, parent) {
            return Err(DomError::Cycle { id: node });
        }
        self.unlink(node)?;
        self.nodes[parent].children.push(node);
        self.nodes[node].parent = Some(parent);
        self.stats.inserts += 1;
        Ok(())
    }

    fn insert_after(
        &mut self,
        parent: DomNodeId,
        node: DomNodeId,
        anchor: Option<DomNodeId>,
    ) -> Result<(), DomError> {
        self.element_mut(parent)?;
        self.node(node)?;
        if self.is_ancestor_or_self(node, parent) {
            return Err(DomError::Cycle { id: node });
        }
        if let Some(anchor) = anchor {
            if anchor == node {
                return Ok(());
            }
            if self.node(anchor)?.parent != Some(parent) {
                return Err(DomError::NotAChild { parent, anchor });
            }
        }
        self.unlink(node)?;
        let siblings = &mut self.nodes[parent].children;
        let index = match anchor {
            Some(anchor) => siblings
                .iter()
                .position(|child| *child == anchor)
                .map_or(siblings.len(), |i| i + 1),
            None => 0,
        };
        siblings.insert(index, node);
        self.nodes[node].parent = Some(parent);
        self.stats.inserts += 1;
        Ok(())
    }

    fn detach(&mut self, node: DomNodeId) -> Result<(), DomError> {
        if self.unlink(node)? {
            self.stats.detaches += 1;
        }
        Ok(())
    }

    fn remove_node(&mut self, node: DomNodeId) -> Result<(), DomError> {
        if !self.nodes.contains_key(node) {
            return Ok(());
        }
        self.detach(node)?;
        if let Some(removed) = self.nodes.remove(node) {
            for child in removed.children {
                if let Some(child) = self.nodes.get_mut(child) {
                    child.parent = None;
                }
            }
        }
        Ok(())
    }

    fn find_by_id(&self, root: DomNodeId, id: &str) -> Option<DomNodeId> {
        self.find(root, |node| self.attribute(node, "id") == Some(id))
    }

    fn scroll_into_view(&mut self, node: DomNodeId) -> Result<(), DomError> {
        self.node(node)?;
        self.scrolled.push(node);
        Ok(())
    }

    fn set_style(&mut self, node: DomNodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?
            .styles
            .insert(property.to_owned(), value.to_owned());
        self.stats.styles += 1;
        Ok(())
    }

    fn remove_style(&mut self, node: DomNodeId, property: &str) -> Result<(), DomError> {
        self.element_mut(node)?.styles.shift_remove(property);
        self.stats.styles += 1;
        Ok(())
    }

    fn add_class(&mut self, node: DomNodeId, class: &str) -> Result<(), DomError> {
        self.element_mut(node)?.classes.insert(class.to_owned());
        self.stats.classes += 1;
        Ok(())
    }

    fn remove_class(&mut self, node: DomNodeId, class: &str) -> Result<(), DomError> {
        self.element_mut(node)?.classes.shift_remove(class);
        self.stats.classes += 1;
        Ok(())
    }

    fn set_attribute(&mut self, node: DomNodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        self.stats.attributes += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: DomNodeId, name: &str) -> Result<(), DomError> {
        self.element_mut(node)?.attributes.shift_remove(name);
        self.stats.attributes += 1;
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: DomNodeId,
        event: &str,
        listener: &Listener,
        passive: bool,
    ) -> Result<(), DomError> {
        let entry = self.element_mut(node)?;
        let exists = entry
            .listeners
            .iter()
            .any(|l| l.event == event && l.listener == *listener);
        if !exists {
            entry.listeners.push(RegisteredListener {
                event: event.to_owned(),
                listener: listener.clone(),
                passive,
            });
        }
        self.stats.listeners += 1;
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: DomNodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), DomError> {
        self.element_mut(node)?
            .listeners
            .retain(|l| !(l.event == event && l.listener == *listener));
        self.stats.listeners += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/dom_tests.rs"]
mod tests;

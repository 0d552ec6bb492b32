//! The explicit handle a render function receives for its tree position.

use std::any::Any;
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::component::ComponentNode;
use crate::dispatch::{DispatchKey, MediaQuery, Snapshot};
use crate::dom::{Dom, DomNodeId};
use crate::error::DomError;
use crate::collections::dependency_key;
use crate::hooks::{
    decode_stored, LocalStorage, Navigator, Rerender, State, ValidationErrors, ValidationState,
    Validator,
};
use crate::host::{Location, WindowSize};
use crate::metadata::{BoundNode, Metadata, MetadataId, RootId};
use crate::props::BaseProps;
use crate::runtime::RuntimeInner;

/// Hook surface for one position during one pass.
///
/// Everything reachable from here is scoped to the node being rendered: its
/// persistent metadata, the children it appends, and the DOM node it binds.
pub struct RenderContext<'a> {
    dom: &'a mut dyn Dom,
    meta: &'a mut Metadata,
    meta_id: MetadataId,
    node: &'a mut ComponentNode,
    runtime: &'a Rc<RuntimeInner>,
    bound: Option<BoundNode>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        dom: &'a mut dyn Dom,
        meta: &'a mut Metadata,
        meta_id: MetadataId,
        node: &'a mut ComponentNode,
        runtime: &'a Rc<RuntimeInner>,
    ) -> Self {
        Self {
            dom,
            meta,
            meta_id,
            node,
            runtime,
            bound: None,
        }
    }

    pub(crate) fn into_bound(self) -> Option<BoundNode> {
        self.bound
    }

    pub fn name(&self) -> &str {
        self.node.name.as_str()
    }

    /// Resolved key of this position under its parent.
    pub fn key(&self) -> &str {
        &self.node.key
    }

    pub fn metadata_id(&self) -> MetadataId {
        self.meta_id
    }

    pub fn root(&self) -> RootId {
        self.meta.root
    }

    /// This node's declared base props; edits here apply to the current pass.
    pub fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.node.base
    }

    pub fn dom(&mut self) -> &mut dyn Dom {
        &mut *self.dom
    }

    /// The DOM node bound at this position by the previous pass.
    pub fn previous_node(&self) -> Option<DomNodeId> {
        self.meta.bound.as_ref().map(|bound| bound.id)
    }

    pub fn append(&mut self, child: ComponentNode) -> &mut ComponentNode {
        self.node.append(child)
    }

    pub fn append_text(&mut self, text: impl Into<String>) -> &mut ComponentNode {
        self.node.append_text(text)
    }

    /// Binds an element with `tag` to this position, reusing the previous
    /// pass's element when the tag and owning component are unchanged.
    pub fn use_node(&mut self, tag: &str) -> DomNodeId {
        self.bind_element(tag, None)
    }

    /// Like [`use_node`](Self::use_node), but a changed `dependency` forces a
    /// fresh element.
    pub fn use_node_with<D: Hash + ?Sized>(&mut self, tag: &str, dependency: &D) -> DomNodeId {
        self.bind_element(tag, Some(dependency_key(dependency)))
    }

    fn bind_element(&mut self, tag: &str, dependency: Option<u64>) -> DomNodeId {
        let tag = tag.to_ascii_lowercase();
        let owner = self.node.name.as_rc();
        let wanted = |bound: &BoundNode| {
            bound.tag.as_deref() == Some(tag.as_str())
                && bound.owner == *owner
                && bound.dependency == dependency
        };
        if let Some(bound) = self.bound.as_ref().filter(|b| wanted(*b)) {
            return bound.id;
        }
        let bound = match self.meta.bound.as_ref().filter(|b| wanted(*b)) {
            Some(previous) => previous.clone(),
            None => BoundNode {
                id: self.dom.create_element(&tag),
                tag: Some(Rc::from(tag.as_str())),
                owner: Rc::clone(owner),
                dependency,
            },
        };
        let id = bound.id;
        self.bound = Some(bound);
        id
    }

    /// Binds a text node holding `text`.
    pub fn use_text_node(&mut self, text: &str) -> Result<DomNodeId, DomError> {
        let owner = self.node.name.as_rc();
        let previous = self
            .meta
            .bound
            .as_ref()
            .filter(|b| !b.is_element() && b.owner == *owner)
            .map(|b| b.id);
        let id = match previous {
            Some(id) => {
                self.dom.set_text(id, text)?;
                id
            }
            None => self.dom.create_text(text),
        };
        self.bound = Some(BoundNode {
            id,
            tag: None,
            owner: Rc::clone(owner),
            dependency: None,
        });
        Ok(id)
    }

    /// Position-local state, seeded by `init` the first time this position renders.
    pub fn use_state<T: 'static>(&mut self, init: impl FnOnce() -> T) -> State<T> {
        let existing = self
            .meta
            .state
            .as_ref()
            .and_then(|state| Rc::clone(state).downcast::<RefCell<T>>().ok());
        let cell = match existing {
            Some(cell) => cell,
            None => {
                if self.meta.state.is_some() {
                    log::warn!(
                        "state type changed at `{}` ({}); reseeding",
                        self.node.key,
                        self.node.name
                    );
                }
                let cell = Rc::new(RefCell::new(init()));
                self.meta.state = Some(Rc::clone(&cell) as Rc<dyn Any>);
                cell
            }
        };
        State::new(cell, self.rerender_handle())
    }

    /// Reads `key` from the host storage, falling back to `default`, and
    /// subscribes this position to storage changes.
    pub fn use_local_storage<T>(&mut self, key: &str, default: T) -> LocalStorage<T>
    where
        T: Serialize + DeserializeOwned + Clone + 'static,
    {
        self.subscribe(DispatchKey::Storage, || Snapshot::None);
        let raw = self.runtime.host.storage.get_item(key);
        let value = decode_stored(key, raw.as_deref()).unwrap_or(default);
        LocalStorage::new(key.to_owned(), value, self.runtime_handle())
    }

    pub fn use_media(&mut self, query: &MediaQuery) -> bool {
        let canonical = query.canonical();
        let runtime = Rc::clone(self.runtime);
        let snapshot = self.subscribe(DispatchKey::Media(canonical.clone()), move || {
            Snapshot::Matches(runtime.host.media.matches(&canonical))
        });
        matches!(snapshot, Snapshot::Matches(true))
    }

    pub fn use_window_resize(&mut self) -> WindowSize {
        let current = self.runtime.window_size.get();
        match self.subscribe(DispatchKey::WindowResize, || Snapshot::Size(current)) {
            Snapshot::Size(size) => size,
            _ => current,
        }
    }

    pub fn use_location(&mut self) -> Location {
        self.subscribe(DispatchKey::Location, || Snapshot::None);
        self.runtime.host.history.location()
    }

    pub fn use_location_hash(&mut self) -> String {
        self.subscribe(DispatchKey::LocationHash, || Snapshot::None);
        self.runtime.host.history.location().hash
    }

    pub fn use_navigate(&mut self) -> Navigator {
        Navigator::new(self.runtime_handle())
    }

    /// Registers `collector` for this position; the returned validator stores
    /// its findings here so the next pass can read them with [`validation`](Self::validation).
    pub fn use_validate(&mut self, collector: impl Fn(&mut ValidationErrors) + 'static) -> Validator {
        let state = Rc::clone(
            self.meta
                .validation
                .get_or_insert_with(|| Rc::new(RefCell::new(ValidationState::default()))),
        );
        Validator::new(state, Rc::new(collector), self.rerender_handle())
    }

    pub fn validation(&self) -> ValidationState {
        self.meta
            .validation
            .as_ref()
            .map(|state| state.borrow().clone())
            .unwrap_or_default()
    }

    /// Schedules another pass of this position's root.
    pub fn rerender(&self) {
        self.rerender_handle().schedule();
    }

    pub fn rerender_handle(&self) -> Rerender {
        Rerender::new(self.runtime_handle(), self.meta.root)
    }

    fn runtime_handle(&self) -> crate::runtime::RuntimeHandle {
        crate::runtime::RuntimeHandle::from_inner(self.runtime)
    }

    fn subscribe(&mut self, key: DispatchKey, init: impl FnOnce() -> Snapshot) -> Snapshot {
        let snapshot =
            self.runtime
                .dispatch
                .borrow_mut()
                .subscribe(&key, init, self.meta_id, self.meta.root);
        self.meta.subscribe(key);
        snapshot
    }
}

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use slotmap::SlotMap;

use crate::component::ComponentNode;
use crate::dispatch::{DispatchKey, DispatchTargets, Snapshot};
use crate::dom::{Dom, DomNodeId};
use crate::error::RenderError;
use crate::hooks::Navigator;
use crate::host::{History, Host, MediaQueries, Storage, WindowSize};
use crate::metadata::{MetadataId, MetadataStore, RootId};
use crate::platform::{DefaultScheduler, FrameScheduler};
use crate::reconcile::Reconciler;

/// Runtime-wide knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeOptions {
    pub warn_on_duplicate_keys: bool,
    pub warn_on_unkeyed_churn: bool,
    /// Events whose listeners are registered as passive.
    pub passive_events: Vec<String>,
    pub window_size: WindowSize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            warn_on_duplicate_keys: true,
            warn_on_unkeyed_churn: true,
            passive_events: vec!["scroll".to_owned(), "wheel".to_owned()],
            window_size: WindowSize::default(),
        }
    }
}

/// Warnings the reconciler has logged since the runtime was built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub duplicate_keys: usize,
    pub unkeyed_churn: usize,
}

struct RootEntry {
    metadata: MetadataId,
    container: DomNodeId,
    committed: Option<ComponentNode>,
    gc_flag: bool,
    pending: bool,
}

pub(crate) struct RuntimeInner {
    scheduler: Arc<dyn FrameScheduler>,
    pub(crate) options: RuntimeOptions,
    pub(crate) host: Host,
    dom: RefCell<Box<dyn Dom>>,
    store: RefCell<MetadataStore>,
    roots: RefCell<SlotMap<RootId, RootEntry>>,
    frame_queue: RefCell<VecDeque<RootId>>, // FUTURE(no_std): migrate to ring buffer.
    pub(crate) dispatch: RefCell<DispatchTargets>,
    pub(crate) window_size: Cell<WindowSize>,
    diagnostics: Cell<Diagnostics>,
}

impl RuntimeInner {
    /// Queues one pass of `root` for the next frame; repeated calls before
    /// that pass runs are absorbed.
    fn schedule_rerender(&self, root: RootId) {
        {
            let mut roots = self.roots.borrow_mut();
            let Some(entry) = roots.get_mut(root) else {
                log::debug!("ignoring rerender of unmounted root {root:?}");
                return;
            };
            if entry.pending {
                return;
            }
            entry.pending = true;
        }
        self.frame_queue.borrow_mut().push_back(root);
        self.scheduler.schedule_frame();
    }

    pub(crate) fn record(&self, f: impl FnOnce(&mut Diagnostics)) {
        let mut diagnostics = self.diagnostics.get();
        f(&mut diagnostics);
        self.diagnostics.set(diagnostics);
    }

    /// Scrolls the element whose id is the current location hash into view.
    fn scroll_to_location_hash(&self) -> bool {
        let hash = self.host.history.location().hash;
        let id = hash.strip_prefix('#').unwrap_or(&hash);
        if id.is_empty() {
            return false;
        }
        let containers: Vec<DomNodeId> =
            self.roots.borrow().values().map(|entry| entry.container).collect();
        let Ok(mut dom) = self.dom.try_borrow_mut() else {
            log::debug!("dom busy, not scrolling to #{id}");
            return false;
        };
        let Some(target) = containers
            .into_iter()
            .find_map(|container| dom.find_by_id(container, id))
        else {
            return false;
        };
        match dom.scroll_into_view(target) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to scroll #{id} into view: {err}");
                false
            }
        }
    }

    fn dispatch(&self, key: &DispatchKey) {
        let roots = self.dispatch.borrow().roots_for(key);
        log::trace!("dispatch {key:?} to {} root(s)", roots.len());
        for root in roots {
            self.schedule_rerender(root);
        }
    }
}

/// Owns the DOM, the metadata arena, every mounted root, and the frame queue.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>, // FUTURE(no_std): replace Rc with arena-managed runtime storage.
}

impl Runtime {
    pub fn new(dom: impl Dom) -> Self {
        Self::builder(dom).build()
    }

    pub fn builder(dom: impl Dom) -> RuntimeBuilder {
        RuntimeBuilder {
            dom: Box::new(dom),
            scheduler: Arc::new(DefaultScheduler),
            host: Host::default(),
            options: RuntimeOptions::default(),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle::from_inner(&self.inner)
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.inner.options
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.inner.diagnostics.get()
    }

    /// Mounts `node` as a new root inside `container` and renders it now.
    ///
    /// A root whose first pass fails is torn down again before the error is returned.
    pub fn mount(&self, node: ComponentNode, container: DomNodeId) -> Result<RootId, RenderError> {
        let root = {
            let mut store = self.inner.store.borrow_mut();
            self.inner
                .roots
                .borrow_mut()
                .insert_with_key(|root| RootEntry {
                    metadata: store.insert_root(root),
                    container,
                    committed: None,
                    gc_flag: false,
                    pending: false,
                })
        };
        log::debug!("mounting `{}` as {root:?} into node {container}", node.name());
        if let Err(err) = render_pass(&self.inner, root, node, None) {
            log::error!("initial render of {root:?} failed: {err}");
            self.unmount(root)?;
            return Err(err);
        }
        Ok(root)
    }

    /// Tears down `root`: every position unmounts with `removed = true`.
    pub fn unmount(&self, root: RootId) -> Result<(), RenderError> {
        let entry = self
            .inner
            .roots
            .borrow_mut()
            .remove(root)
            .ok_or(RenderError::UnknownRoot(root))?;
        self.inner.frame_queue.borrow_mut().retain(|queued| *queued != root);
        {
            let mut dom = self.inner.dom.borrow_mut();
            let mut store = self.inner.store.borrow_mut();
            Reconciler::new(&mut **dom, &mut *store, &self.inner, entry.gc_flag)
                .teardown(entry.metadata);
        }
        log::debug!("unmounted {root:?}");
        drop(entry);
        Ok(())
    }

    pub fn schedule_rerender(&self, root: RootId) {
        self.inner.schedule_rerender(root);
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.inner.frame_queue.borrow().is_empty()
    }

    /// Runs one pass for every root queued since the last frame.
    ///
    /// Each root renders at most once per call. A failing root is logged and
    /// skipped; the others still render and the first error is returned.
    pub fn run_frame(&self, frame_time_nanos: u64) -> Result<usize, RenderError> {
        let queued: Vec<RootId> = self.inner.frame_queue.borrow_mut().drain(..).collect();
        if queued.is_empty() {
            return Ok(0);
        }
        log::trace!("frame at {frame_time_nanos}ns: {} root(s)", queued.len());
        let mut rendered = 0;
        let mut first_error = None;
        for root in queued {
            let previous = match self.inner.roots.borrow_mut().get_mut(root) {
                Some(entry) => entry.committed.take(),
                None => continue,
            };
            let result = match previous {
                Some(previous) => {
                    let node = previous.shallow_clone();
                    render_pass(&self.inner, root, node, Some(previous))
                }
                None => Err(RenderError::UnknownRoot(root)),
            };
            if let Some(entry) = self.inner.roots.borrow_mut().get_mut(root) {
                entry.pending = false;
            }
            match result {
                Ok(()) => rendered += 1,
                Err(err) => {
                    log::error!("render of {root:?} failed: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(rendered),
        }
    }

    pub fn with_dom<R>(&self, f: impl FnOnce(&mut dyn Dom) -> R) -> R {
        let mut dom = self.inner.dom.borrow_mut();
        f(&mut **dom)
    }

    /// Runs `f` against the concrete DOM type, if it is a `D`.
    pub fn with_dom_as<D: Dom, R>(&self, f: impl FnOnce(&mut D) -> R) -> Option<R> {
        let mut dom = self.inner.dom.borrow_mut();
        let dom: &mut dyn Dom = &mut **dom;
        dom.downcast_mut::<D>().map(f)
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.handle())
    }

    pub fn root_count(&self) -> usize {
        self.inner.roots.borrow().len()
    }

    pub fn metadata_count(&self) -> usize {
        self.inner.store.borrow().len()
    }

    pub fn is_live(&self, id: MetadataId) -> bool {
        let store = self.inner.store.borrow();
        let roots = self.inner.roots.borrow();
        store
            .get(id)
            .and_then(|meta| roots.get(meta.root))
            .is_some_and(|entry| store.is_reachable(id, entry.metadata))
    }

    /// Current subscribers of `key`, across all roots.
    pub fn subscriber_count(&self, key: &DispatchKey) -> usize {
        self.inner
            .dispatch
            .borrow()
            .get(key)
            .map_or(0, |target| target.subscriber_count())
    }

    pub fn dispatch_target_count(&self) -> usize {
        self.inner.dispatch.borrow().len()
    }

    /// The host reported a storage change from another browsing context.
    pub fn notify_storage_changed(&self) {
        self.inner.dispatch(&DispatchKey::Storage);
    }

    /// Re-evaluates every known media query and rerenders subscribers of the
    /// ones whose match state flipped.
    pub fn notify_media_change(&self) {
        let queries = self.inner.dispatch.borrow().media_queries();
        for query in queries {
            let matches = self.inner.host.media.matches(&query);
            let key = DispatchKey::Media(query);
            let changed = self
                .inner
                .dispatch
                .borrow_mut()
                .update_snapshot(&key, Snapshot::Matches(matches));
            if changed {
                self.inner.dispatch(&key);
            }
        }
    }

    pub fn resize_window(&self, size: WindowSize) {
        self.inner.window_size.set(size);
        let changed = self
            .inner
            .dispatch
            .borrow_mut()
            .update_snapshot(&DispatchKey::WindowResize, Snapshot::Size(size));
        if changed {
            self.inner.dispatch(&DispatchKey::WindowResize);
        }
    }

    /// The host navigated (for example a history pop).
    pub fn notify_location_changed(&self) {
        self.inner.dispatch(&DispatchKey::Location);
        self.inner.dispatch(&DispatchKey::LocationHash);
    }

    /// The host's location hash changed: scrolls to the element it names,
    /// then rerenders hash subscribers.
    pub fn notify_hash_changed(&self) {
        self.inner.scroll_to_location_hash();
        self.inner.dispatch(&DispatchKey::LocationHash);
    }

    /// Scrolls to the element named by the location hash, if one is mounted.
    /// Hosts call this once after the first frame.
    pub fn scroll_to_location_hash(&self) -> bool {
        self.inner.scroll_to_location_hash()
    }
}

fn render_pass(
    inner: &Rc<RuntimeInner>,
    root: RootId,
    mut node: ComponentNode,
    previous: Option<ComponentNode>,
) -> Result<(), RenderError> {
    let (metadata, container, flag) = {
        let mut roots = inner.roots.borrow_mut();
        let entry = roots.get_mut(root).ok_or(RenderError::UnknownRoot(root))?;
        entry.gc_flag = !entry.gc_flag;
        (entry.metadata, entry.container, entry.gc_flag)
    };
    node.metadata = Some(metadata);
    let result = {
        let mut dom = inner.dom.borrow_mut();
        let mut store = inner.store.borrow_mut();
        if let Some(meta) = store.get_mut(metadata) {
            meta.gc_flag = flag;
        }
        let mut reconciler = Reconciler::new(&mut **dom, &mut *store, inner, flag);
        let result = reconciler.render_root(&mut node, container);
        // Positions a failed pass never reached are swept too, so the flags
        // stay consistent with the tree committed below. They unmount with
        // `removed = true` and the next pass recreates them.
        if let Some(previous) = &previous {
            reconciler.sweep(previous);
        }
        result
    };
    if let Some(entry) = inner.roots.borrow_mut().get_mut(root) {
        entry.committed = Some(node);
    }
    log::trace!("pass of {root:?} done (flag {flag})");
    result
}

pub struct RuntimeBuilder {
    dom: Box<dyn Dom>,
    scheduler: Arc<dyn FrameScheduler>,
    host: Host,
    options: RuntimeOptions,
}

impl RuntimeBuilder {
    pub fn scheduler(mut self, scheduler: Arc<dyn FrameScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.host.storage = Box::new(storage);
        self
    }

    pub fn media(mut self, media: impl MediaQueries + 'static) -> Self {
        self.host.media = Box::new(media);
        self
    }

    pub fn history(mut self, history: impl History + 'static) -> Self {
        self.host.history = Box::new(history);
        self
    }

    pub fn options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn window_size(mut self, size: WindowSize) -> Self {
        self.options.window_size = size;
        self
    }

    pub fn build(self) -> Runtime {
        let window_size = self.options.window_size;
        Runtime {
            inner: Rc::new(RuntimeInner {
                scheduler: self.scheduler,
                options: self.options,
                host: self.host,
                dom: RefCell::new(self.dom),
                store: RefCell::new(MetadataStore::new()),
                roots: RefCell::new(SlotMap::with_key()),
                frame_queue: RefCell::new(VecDeque::new()),
                dispatch: RefCell::new(DispatchTargets::default()),
                window_size: Cell::new(window_size),
                diagnostics: Cell::new(Diagnostics::default()),
            }),
        }
    }
}

/// Weak handle held by hook handles and listeners; a dropped runtime turns
/// every operation into a no-op.
#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    pub(crate) fn from_inner(inner: &Rc<RuntimeInner>) -> Self {
        RuntimeHandle(Rc::downgrade(inner))
    }

    pub fn upgrade(&self) -> Option<Runtime> {
        self.0.upgrade().map(|inner| Runtime { inner })
    }

    pub fn schedule_rerender(&self, root: RootId) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule_rerender(root);
        }
    }

    pub fn dispatch(&self, key: &DispatchKey) {
        if let Some(inner) = self.0.upgrade() {
            inner.dispatch(key);
        }
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&Host) -> R) -> Option<R> {
        self.0.upgrade().map(|inner| f(&inner.host))
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;

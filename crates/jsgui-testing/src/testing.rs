use jsgui_core::{
    ComponentNode, Dom, DomNodeId, Event, MemoryDom, MemoryHistory, MemoryMedia, MemoryStorage,
    RenderError, RootId, Runtime, RuntimeOptions, WindowSize,
};

/// Upper bound on frames [`TestApp::pump_until_idle`] runs before giving up
/// on a root that keeps rescheduling itself.
const MAX_IDLE_FRAMES: usize = 64;

/// Headless harness for exercising component trees in tests.
///
/// Owns a [`Runtime`] over a [`MemoryDom`] and in-memory host services, and
/// keeps clones of those services so a test can drive media, storage and
/// history changes from outside.
pub struct TestApp {
    runtime: Runtime,
    body: DomNodeId,
    root: Option<RootId>,
    storage: MemoryStorage,
    media: MemoryMedia,
    history: MemoryHistory,
    frame_time_nanos: u64,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// A harness whose storage is shared with every other harness built from
    /// a clone of `storage`.
    pub fn with_storage(storage: MemoryStorage) -> Self {
        Self::build(storage, RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Self::build(MemoryStorage::new(), options)
    }

    fn build(storage: MemoryStorage, options: RuntimeOptions) -> Self {
        let media = MemoryMedia::new();
        let history = MemoryHistory::default();
        let runtime = Runtime::builder(MemoryDom::new())
            .storage(storage.clone())
            .media(media.clone())
            .history(history.clone())
            .options(options)
            .build();
        let body = runtime.with_dom(|dom| dom.create_element("body"));
        Self {
            runtime,
            body,
            root: None,
            storage,
            media,
            history,
            frame_time_nanos: 0,
        }
    }

    /// Mount `node` into the body and perform the initial render.
    pub fn set_content(&mut self, node: ComponentNode) -> Result<RootId, RenderError> {
        let root = self.runtime.mount(node, self.body)?;
        self.root = Some(root);
        Ok(root)
    }

    /// Run one frame at a 16ms cadence; returns how many roots rendered.
    pub fn frame(&mut self) -> Result<usize, RenderError> {
        self.frame_time_nanos += 16_000_000;
        self.runtime.run_frame(self.frame_time_nanos)
    }

    /// Drive frames until nothing is pending; returns the total passes run.
    pub fn pump_until_idle(&mut self) -> Result<usize, RenderError> {
        let mut passes = 0;
        for _ in 0..MAX_IDLE_FRAMES {
            if !self.runtime.has_pending_frame() {
                return Ok(passes);
            }
            passes += self.frame()?;
        }
        log::warn!("still pending after {MAX_IDLE_FRAMES} frames");
        Ok(passes)
    }

    /// Schedule a pass of the mounted root and run it.
    pub fn rerender(&mut self) -> Result<usize, RenderError> {
        if let Some(root) = self.root {
            self.runtime.schedule_rerender(root);
        }
        self.pump_until_idle()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn root(&self) -> Option<RootId> {
        self.root
    }

    /// The container every root of this harness is mounted into.
    pub fn body(&self) -> DomNodeId {
        self.body
    }

    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    pub fn media(&self) -> &MemoryMedia {
        &self.media
    }

    pub fn history(&self) -> &MemoryHistory {
        &self.history
    }

    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MemoryDom) -> R) -> R {
        self.runtime
            .with_dom_as(f)
            .expect("TestApp always runs over a MemoryDom")
    }

    /// Text content of the whole body.
    pub fn text(&self) -> String {
        self.with_dom(|dom| dom.text_content(self.body))
    }

    pub fn text_of(&self, node: DomNodeId) -> String {
        self.with_dom(|dom| dom.text_content(node))
    }

    pub fn find_by_class(&self, class: &str) -> Option<DomNodeId> {
        self.with_dom(|dom| dom.find_by_class(self.body, class))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<DomNodeId> {
        self.with_dom(|dom| dom.find_by_tag(self.body, tag))
    }

    pub fn dump(&self) -> String {
        self.with_dom(|dom| dom.dump_tree(self.body))
    }

    /// Deliver `event` to its target and every ancestor's listeners.
    ///
    /// Listeners run after the DOM borrow is released, so they may schedule
    /// rerenders or touch hook handles freely.
    pub fn dispatch(&self, event: Event) -> usize {
        let listeners = self.with_dom(|dom| dom.bubbling_listeners(event.target, &event.name));
        for listener in &listeners {
            listener.call(&event);
        }
        listeners.len()
    }

    pub fn click(&self, target: DomNodeId) -> usize {
        self.dispatch(Event::new("click", target))
    }

    pub fn input(&self, target: DomNodeId, value: &str) -> usize {
        self.dispatch(Event::new("input", target).with_value(value))
    }

    /// Flip a media query answer and notify the runtime.
    pub fn set_media(&self, query: &str, matches: bool) {
        self.media.set(query, matches);
        self.runtime.notify_media_change();
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.runtime.resize_window(WindowSize::new(width, height));
    }

    /// Step the history back one entry, as a browser back button would.
    pub fn back(&self) -> bool {
        let moved = self.history.back();
        if moved {
            self.runtime.notify_location_changed();
        }
        moved
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a `TestApp`.
pub fn run_test_app<R>(f: impl FnOnce(&mut TestApp) -> R) -> R {
    let mut app = TestApp::new();
    f(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsgui_core::{Listener, RenderContext};
    use jsgui_macros::component;

    #[component]
    fn clicker(cx: &mut RenderContext<'_>) {
        let clicks = cx.use_state(|| 0u32);
        cx.use_node("button");
        let handle = clicks.clone();
        cx.base_mut().events.insert(
            "click".into(),
            Some(Listener::new(move |_| handle.update_and_rerender(|n| *n += 1))),
        );
        cx.append_text(format!("clicked {}", clicks.get()));
    }

    #[test]
    fn test_app_drives_clicks_through_frames() {
        run_test_app(|app| {
            assert!(app.root().is_none());
            app.set_content(clicker()).expect("mount");
            assert_eq!(app.text(), "clicked 0");

            let button = app.find_by_tag("button").expect("button");
            assert_eq!(app.click(button), 1);
            assert_eq!(app.pump_until_idle().expect("frames"), 1);
            assert_eq!(app.text(), "clicked 1");
            assert_eq!(app.pump_until_idle().expect("idle"), 0);
        });
    }

    #[test]
    fn back_navigation_notifies_only_when_history_moves() {
        let app = TestApp::new();
        assert!(!app.back());
        app.runtime().navigator().push("/next");
        assert!(app.back());
        assert_eq!(app.history().len(), 2);
    }
}

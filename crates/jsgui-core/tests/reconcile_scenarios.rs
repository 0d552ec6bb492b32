use std::cell::RefCell;
use std::rc::Rc;

use jsgui_core::{
    DispatchKey, DomNodeId, Lifecycle, Listener, LocalStorage, MemoryStorage, RenderContext,
    State,
};
use jsgui_macros::component;
use jsgui_testing::TestApp;

#[derive(Clone, Debug, PartialEq)]
struct Todo {
    id: u32,
    title: String,
}

#[component]
fn todo_row(cx: &mut RenderContext<'_>, todo: Todo, log: Rc<RefCell<Vec<String>>>) -> Lifecycle {
    let edits = cx.use_state(|| 0u32);
    cx.use_node("li");
    cx.append_text(format!("{} ({})", todo.title, edits.get()));
    let handle = edits.clone();
    cx.base_mut().events.insert(
        "click".into(),
        Some(Listener::new(move |_| handle.update_and_rerender(|n| *n += 1))),
    );
    let title = todo.title.clone();
    Lifecycle::new().on_unmount(move |removed| {
        if removed {
            log.borrow_mut().push(title);
        }
    })
}

#[component]
fn todo_list(cx: &mut RenderContext<'_>, todos: Rc<RefCell<Vec<Todo>>>, log: Rc<RefCell<Vec<String>>>) {
    cx.use_node("ul");
    for todo in todos.borrow().iter() {
        cx.append(todo_row(todo.clone(), Rc::clone(&log)).key(todo.id.to_string()));
    }
}

fn rows(app: &TestApp) -> Vec<DomNodeId> {
    app.with_dom(|dom| {
        let ul = dom.find_by_tag(app.body(), "ul").expect("list");
        dom.children(ul).to_vec()
    })
}

#[test]
fn keyed_rows_keep_state_and_nodes_when_list_changes() {
    let todos = Rc::new(RefCell::new(vec![
        Todo { id: 1, title: "write".into() },
        Todo { id: 2, title: "test".into() },
        Todo { id: 3, title: "ship".into() },
    ]));
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let mut app = TestApp::new();
    app.set_content(todo_list(Rc::clone(&todos), Rc::clone(&log)))
        .expect("mount");
    let before = rows(&app);

    app.click(before[1]);
    app.pump_until_idle().expect("click frame");
    assert_eq!(app.text_of(before[1]), "test (1)");

    todos.borrow_mut().remove(0);
    todos.borrow_mut().insert(1, Todo { id: 4, title: "review".into() });
    app.rerender().expect("rerender");

    let after = rows(&app);
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[1]);
    assert_eq!(after[2], before[2]);
    assert_eq!(app.text_of(after[0]), "test (1)");
    assert_eq!(app.text_of(after[1]), "review (0)");
    assert_eq!(*log.borrow(), vec!["write".to_string()]);
    assert_eq!(app.with_dom(|dom| dom.parent(before[0])), None);
}

#[test]
fn stable_tree_rerender_is_free_of_property_writes() {
    let todos = Rc::new(RefCell::new(vec![Todo { id: 7, title: "idle".into() }]));
    let mut app = TestApp::new();
    app.set_content(todo_list(Rc::clone(&todos), Rc::default()))
        .expect("mount");
    app.with_dom(|dom| dom.reset_mutations());

    app.rerender().expect("rerender");
    let stats = app.with_dom(|dom| dom.mutations());
    // Row listeners are rebuilt each pass, so only listener swaps remain.
    assert_eq!(stats.styles + stats.classes + stats.attributes, 0);
    assert_eq!(stats.texts + stats.inserts + stats.detaches, 0);
}

#[component]
fn theme_label(cx: &mut RenderContext<'_>, slot: Rc<RefCell<Option<LocalStorage<String>>>>) {
    let theme = cx.use_local_storage("theme", "light".to_owned());
    cx.use_node("span");
    cx.append_text(theme.get());
    *slot.borrow_mut() = Some(theme);
}

#[test]
fn storage_changes_propagate_between_apps_sharing_storage() {
    let storage = MemoryStorage::new();
    let slot: Rc<RefCell<Option<LocalStorage<String>>>> = Rc::default();
    let mut writer = TestApp::with_storage(storage.clone());
    let mut reader = TestApp::with_storage(storage);
    writer.set_content(theme_label(Rc::clone(&slot))).expect("writer");
    reader.set_content(theme_label(Rc::default())).expect("reader");
    assert_eq!(reader.text(), "light");

    let handle = slot.borrow().clone().expect("handle");
    handle.set_and_dispatch(&"dark".to_owned()).expect("store");
    writer.pump_until_idle().expect("writer frame");
    assert_eq!(writer.text(), "dark");
    assert_eq!(reader.text(), "light");

    reader.runtime().notify_storage_changed();
    reader.pump_until_idle().expect("reader frame");
    assert_eq!(reader.text(), "dark");
}

#[component(fragment)]
fn themed(cx: &mut RenderContext<'_>) {
    cx.append(panel());
}

#[component]
fn panel(cx: &mut RenderContext<'_>) {
    cx.use_node("div");
}

#[test]
fn fragment_style_reaches_first_element() {
    let mut app = TestApp::new();
    app.set_content(themed().style("color", "red").css_var("gap", 4))
        .expect("mount");
    app.with_dom(|dom| {
        let div = dom.find_by_class(app.body(), "panel").expect("panel");
        assert_eq!(dom.style(div, "color"), Some("red"));
        assert_eq!(dom.style(div, "--gap"), Some("4px"));
    });
}

#[component]
fn counter(cx: &mut RenderContext<'_>, slot: Rc<RefCell<Option<State<u32>>>>) {
    let count = cx.use_state(|| 1u32);
    cx.append_text(count.get().to_string());
    *slot.borrow_mut() = Some(count);
}

#[test]
fn many_updates_before_a_frame_render_once() {
    let slot: Rc<RefCell<Option<State<u32>>>> = Rc::default();
    let mut app = TestApp::new();
    app.set_content(counter(Rc::clone(&slot))).expect("mount");
    assert_eq!(app.text(), "1");

    let state = slot.borrow().clone().expect("state");
    state.update_and_rerender(|n| *n += 1);
    state.update_and_rerender(|n| *n += 1);
    assert_eq!(app.pump_until_idle().expect("frames"), 1);
    assert_eq!(app.text(), "3");
}

#[component]
fn responsive(cx: &mut RenderContext<'_>) {
    let size = cx.use_window_resize();
    let wide = cx.use_media(&jsgui_core::MediaQuery::new().feature("minWidth", 900));
    cx.append_text(format!("{}:{}", size.width, if wide { "wide" } else { "narrow" }));
}

#[test]
fn media_and_resize_subscribers_follow_the_host() {
    let mut app = TestApp::new();
    app.set_content(responsive()).expect("mount");
    assert_eq!(app.text(), "1024:narrow");

    app.set_media("(min-width: 900px)", true);
    app.resize(1200.0, 800.0);
    assert_eq!(app.pump_until_idle().expect("frames"), 1);
    assert_eq!(app.text(), "1200:wide");

    let root = app.root().expect("root");
    app.runtime().unmount(root).expect("unmount");
    assert_eq!(app.runtime().subscriber_count(&DispatchKey::WindowResize), 0);
    assert_eq!(app.runtime().dispatch_target_count(), 2);
}

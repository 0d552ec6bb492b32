use jsgui_core::{
    Dom, DomNodeId, Lifecycle, MemoryDom, RenderContext, RenderError, RootId, Runtime,
};
use jsgui_macros::component;

#[component]
fn greeting(cx: &mut RenderContext<'_>, name: String, excited: bool) {
    cx.use_node("p");
    let suffix = if excited { "!" } else { "." };
    cx.append_text(format!("Hello, {name}{suffix}"));
}

#[component(name = "panel")]
fn panel_body(cx: &mut RenderContext<'_>) -> Lifecycle {
    cx.use_node("div");
    Lifecycle::new()
}

#[component(fragment)]
fn pair(cx: &mut RenderContext<'_>, (left, right): (String, String)) {
    cx.append(greeting(left, false));
    cx.append(greeting(right, true));
}

#[component]
fn guarded(cx: &mut RenderContext<'_>, allowed: bool) -> Result<(), RenderError> {
    if !allowed {
        return Err(RenderError::failed(cx.name(), "denied"));
    }
    cx.use_node("span");
    Ok(())
}

fn mount(node: jsgui_core::ComponentNode) -> (Runtime, DomNodeId, RootId) {
    let runtime = Runtime::new(MemoryDom::new());
    let body = runtime.with_dom(|dom| dom.create_element("body"));
    let root = runtime.mount(node, body).expect("mount");
    (runtime, body, root)
}

fn text(runtime: &Runtime, node: DomNodeId) -> String {
    runtime
        .with_dom_as(|dom: &mut MemoryDom| dom.text_content(node))
        .expect("memory dom")
}

#[test]
fn generated_constructor_uses_function_name() {
    let node = greeting("Ada".to_owned(), true);
    assert_eq!(node.name().as_str(), "greeting");
    let (runtime, body, _) = mount(node);
    assert_eq!(text(&runtime, body), "Hello, Ada!");
    let classes = runtime
        .with_dom_as(|dom: &mut MemoryDom| {
            let p = dom.find_by_tag(body, "p").expect("p");
            dom.classes(p)
        })
        .expect("memory dom");
    assert_eq!(classes, vec!["greeting".to_string()]);
}

#[test]
fn name_override_and_fragment() {
    assert_eq!(panel_body().name().as_str(), "panel");
    let node = pair(("a".to_owned(), "b".to_owned()));
    assert!(node.name().is_fragment());
    let (runtime, body, _) = mount(node);
    assert_eq!(text(&runtime, body), "Hello, a.Hello, b!");
}

#[test]
fn arguments_are_replayed_on_rerender() {
    let (runtime, body, root) = mount(greeting("Lin".to_owned(), false));
    runtime.schedule_rerender(root);
    assert_eq!(runtime.run_frame(0).expect("frame"), 1);
    assert_eq!(text(&runtime, body), "Hello, Lin.");
}

#[test]
fn render_errors_propagate() {
    let runtime = Runtime::new(MemoryDom::new());
    let body = runtime.with_dom(|dom| dom.create_element("body"));
    assert!(runtime.mount(guarded(false), body).is_err());
    assert!(runtime.mount(guarded(true), body).is_ok());
}

use std::sync::mpsc;

use jsgui_core::{DomNodeId, Event, Listener, MemoryDom, MemoryStorage, RenderContext, Runtime};
use jsgui_runtime_std::StdRuntime;
use jsgui_ui::{
    button, button_with, component, element, router, span, span_with, ButtonProps, PageWrapperProps, Route,
    RouteError, RouteParams, RouteTable, RouterProps, SpanProps,
};

#[component]
fn counter(cx: &mut RenderContext<'_>, step: i64) {
    let count = cx.use_state(|| 0i64);
    cx.use_node("section");
    cx.append(span(format!("Count: {}", count.get())).class_name("count"));
    let up = count.clone();
    cx.append(
        button("Increment", Listener::new(move |_| up.update_and_rerender(|n| *n += step)))
            .class_name("increment"),
    );
    let down = count.clone();
    cx.append(
        button("Decrement", Listener::new(move |_| down.update_and_rerender(|n| *n -= step)))
            .class_name("decrement"),
    );
}

#[component]
fn theme_toggle(cx: &mut RenderContext<'_>) {
    let theme = cx.use_local_storage("theme", String::from("light"));
    let next = if theme.value() == "light" { "dark" } else { "light" };
    let handle = theme.clone();
    let next = next.to_owned();
    cx.append(button_with(
        format!("Theme: {}", theme.value()),
        ButtonProps {
            on_click: Some(Listener::new(move |_| {
                if let Err(err) = handle.set_and_dispatch(&next) {
                    log::error!("failed to store theme: {err}");
                }
            })),
            ..ButtonProps::default()
        },
    )
    .class_name("theme"));
}

#[component]
fn layout(cx: &mut RenderContext<'_>, props: PageWrapperProps) {
    cx.use_node("main");
    let mut nav = element("nav");
    for entry in props.routes.navigation() {
        let mut link = SpanProps::link(entry.path);
        link.replace_path = true;
        nav.append(span_with(entry.label.to_owned(), link).key(entry.path));
    }
    cx.append(nav);
    cx.append(theme_toggle());
    cx.append(props.content());
}

fn app_routes() -> Result<RouteTable, RouteError> {
    RouteTable::new(vec![
        Route::new("/", |_: &RouteParams| span("Welcome")).in_navigation("Home"),
        Route::new("/counter/:step", |params: &RouteParams| {
            let step = params.get("step").and_then(|s| s.parse().ok()).unwrap_or(1);
            counter(step)
        })
        .default_path("/counter/1")
        .in_navigation("Counter"),
    ])
}

enum Step {
    Click(&'static str),
    Navigate(&'static str),
}

const SCRIPT: &[Step] = &[
    Step::Navigate("/counter/1"),
    Step::Click("increment"),
    Step::Click("increment"),
    Step::Click("decrement"),
    Step::Click("theme"),
    Step::Navigate("/counter/5"),
    Step::Click("increment"),
    Step::Navigate("/"),
];

fn click(runtime: &Runtime, body: DomNodeId, class: &str) {
    let listeners = runtime
        .with_dom_as(|dom: &mut MemoryDom| {
            let target = dom.find_by_class(body, class)?;
            let listeners = dom.bubbling_listeners(target, "click");
            Some((target, listeners))
        })
        .flatten();
    let Some((target, listeners)) = listeners else {
        log::warn!("nothing to click for `.{class}`");
        return;
    };
    let event = Event::new("click", target);
    for listener in listeners {
        listener.call(&event);
    }
}

fn main() {
    env_logger::init();

    println!("=== jsgui counter demo ===");
    println!("Runs a scripted session against an in-memory DOM and prints the tree after each step.");
    println!();

    let routes = match app_routes() {
        Ok(routes) => routes,
        Err(err) => {
            log::error!("{err}");
            return;
        }
    };
    let std_runtime = StdRuntime::from_builder(
        Runtime::builder(MemoryDom::new()).storage(MemoryStorage::new()),
    );
    let (frames, frame_requests) = mpsc::channel();
    std_runtime.set_frame_waker(move || {
        let _ = frames.send(());
    });

    let runtime = std_runtime.runtime();
    let body = runtime.with_dom(|dom| dom.create_element("body"));
    let props = RouterProps::new(routes).page_wrapper(layout);
    if let Err(err) = runtime.mount(router(props), body) {
        log::error!("initial render failed: {err}");
        return;
    }
    print_tree(&runtime, body, "mounted");

    for step in SCRIPT {
        let label = match step {
            Step::Click(class) => {
                click(&runtime, body, class);
                format!("click .{class}")
            }
            Step::Navigate(url) => {
                runtime.navigator().push(url);
                format!("navigate {url}")
            }
        };
        while frame_requests.try_recv().is_ok() {}
        match std_runtime.pump() {
            Ok(rendered) => log::debug!("{label}: {rendered} root(s) rendered"),
            Err(err) => log::error!("{label}: {err}"),
        }
        print_tree(&runtime, body, &label);
    }
}

fn print_tree(runtime: &Runtime, body: DomNodeId, label: &str) {
    let tree = runtime
        .with_dom_as(|dom: &mut MemoryDom| dom.dump_tree(body))
        .unwrap_or_default();
    println!("--- {label} ---");
    println!("{tree}");
}

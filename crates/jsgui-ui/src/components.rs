use jsgui_core::{
    AttrValue, ComponentName, ComponentNode, Listener, Navigator, RenderContext, State, StyleValue,
};

use crate::component;

/// Groups children without binding a node of its own.
#[component(fragment)]
pub fn fragment(_cx: &mut RenderContext<'_>) {}

#[component]
pub fn div(cx: &mut RenderContext<'_>) {
    cx.use_node("div");
}

/// A component that binds an element of `tag` and is named after it.
pub fn element(tag: &str) -> ComponentNode {
    let tag = tag.to_ascii_lowercase();
    ComponentNode::new(ComponentName::fixed(&tag), move |cx: &mut RenderContext<'_>| {
        cx.use_node(&tag);
    })
}

#[derive(Clone, Debug, Default)]
pub struct SpanProps {
    /// Renders an `<a>` pointing here instead of a `<span>`.
    pub href: Option<String>,
    /// Clicking the link replaces the current history entry with `href`.
    pub replace_path: bool,
    pub id: Option<String>,
    pub size: Option<String>,
    /// Palette name, applied as `var(--<color>)`.
    pub color: Option<String>,
    pub single_line: bool,
    pub on_click: Option<Listener>,
}

impl SpanProps {
    pub fn link(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }
}

pub fn span(text: impl Into<String>) -> ComponentNode {
    span_with(text.into(), SpanProps::default())
}

#[component(name = "span")]
pub fn span_with(cx: &mut RenderContext<'_>, text: String, props: SpanProps) {
    let SpanProps {
        href,
        replace_path,
        id,
        size,
        color,
        single_line,
        on_click,
    } = props;
    cx.use_node(if href.is_some() { "a" } else { "span" });
    let navigate = cx.use_navigate();
    // (href, on_click, wrapper) from the last pass.
    let link_click = cx.use_state(|| None::<(String, Option<Listener>, Listener)>);

    let base = cx.base_mut();
    if let Some(id) = id {
        base.attribute.insert("id".into(), Some(AttrValue::from(id)));
    }
    if let Some(size) = size {
        base.attribute.insert("dataSize".into(), Some(AttrValue::from(size)));
    }
    if let Some(color) = color {
        base.style
            .insert("color".into(), Some(StyleValue::from(format!("var(--{color})"))));
    }
    if single_line {
        base.class_name.push("ellipsis".into());
    }
    match href {
        Some(href) => {
            base.attribute
                .insert("href".into(), Some(AttrValue::from(href.as_str())));
            if replace_path {
                let listener = replace_on_click(&link_click, navigate, href, on_click);
                base.events.insert("click".into(), Some(listener));
            }
        }
        None => {
            if let Some(on_click) = on_click {
                base.events.insert("click".into(), Some(on_click));
                base.attribute.insert("tabindex".into(), Some(AttrValue::from("-1")));
                base.attribute.insert("clickable".into(), Some(AttrValue::from(true)));
            }
        }
    }
    if !text.is_empty() {
        cx.append_text(text);
    }
}

/// The click wrapper of a replacing link, rebuilt only when its target or
/// inner handler changed so reconciliation sees the same listener.
fn replace_on_click(
    cache: &State<Option<(String, Option<Listener>, Listener)>>,
    navigate: Navigator,
    href: String,
    on_click: Option<Listener>,
) -> Listener {
    if let Some((cached_href, cached_on_click, listener)) = cache.get() {
        if cached_href == href && cached_on_click == on_click {
            return listener;
        }
    }
    let target = href.clone();
    let inner = on_click.clone();
    let listener = Listener::new(move |event| {
        navigate.replace(&target);
        if let Some(inner) = &inner {
            inner.call(event);
        }
    });
    cache.set(Some((href, on_click, listener.clone())));
    listener
}

#[derive(Clone, Debug, Default)]
pub struct ButtonProps {
    pub size: Option<String>,
    /// Palette name; sets the `buttonColor*` custom properties.
    pub color: Option<String>,
    pub on_click: Option<Listener>,
    pub disabled: bool,
}

pub fn button(text: impl Into<String>, on_click: Listener) -> ComponentNode {
    button_with(
        text.into(),
        ButtonProps {
            on_click: Some(on_click),
            ..ButtonProps::default()
        },
    )
}

#[component(name = "button")]
pub fn button_with(cx: &mut RenderContext<'_>, text: String, props: ButtonProps) {
    cx.use_node("button");
    if !text.is_empty() {
        cx.append(span(text));
    }
    let base = cx.base_mut();
    if let Some(size) = props.size {
        base.attribute.insert("dataSize".into(), Some(AttrValue::from(size)));
    }
    if let Some(color) = props.color {
        for (var, suffix) in [
            ("buttonColor", ""),
            ("buttonColorHover", "-033"),
            ("buttonColorActive", "-067"),
        ] {
            base.css_vars.insert(
                var.into(),
                Some(StyleValue::from(format!("var(--{color}{suffix})"))),
            );
        }
    }
    if props.disabled {
        base.attribute.insert("disabled".into(), Some(AttrValue::from("true")));
    } else if let Some(on_click) = props.on_click {
        base.events.insert("click".into(), Some(on_click));
    }
}

#[cfg(test)]
#[path = "tests/components_tests.rs"]
mod tests;

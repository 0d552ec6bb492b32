//! Component definitions and the ephemeral node tree a render pass consumes.

use std::fmt;
use std::rc::Rc;

use crate::context::RenderContext;
use crate::dom::{Dom, Listener};
use crate::error::{ComponentError, RenderError};
use crate::metadata::MetadataId;
use crate::props::{AttrValue, BaseProps, ClassList, StyleValue};

pub type RenderResult = Result<Lifecycle, RenderError>;
pub type MountCallback = Box<dyn FnOnce(&mut dyn Dom)>;
pub type UnmountCallback = Box<dyn FnOnce(bool)>;

type RenderFn = Rc<dyn Fn(&mut RenderContext<'_>) -> RenderResult>;

pub(crate) const TEXT_COMPONENT: &str = "#text";

/// Callbacks a render function hands back to the reconciler.
#[derive(Default)]
pub struct Lifecycle {
    pub(crate) on_mount: Option<MountCallback>,
    pub(crate) on_unmount: Option<UnmountCallback>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs after this position's children have been reconciled.
    pub fn on_mount(mut self, callback: impl FnOnce(&mut dyn Dom) + 'static) -> Self {
        self.on_mount = Some(Box::new(callback));
        self
    }

    /// Runs with `false` when the next pass replaces this callback, or with
    /// `true` when the position is torn down.
    pub fn on_unmount(mut self, callback: impl FnOnce(bool) + 'static) -> Self {
        self.on_unmount = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("on_mount", &self.on_mount.is_some())
            .field("on_unmount", &self.on_unmount.is_some())
            .finish()
    }
}

/// What a render function may return.
pub trait IntoRenderResult {
    fn into_render_result(self) -> RenderResult;
}

impl IntoRenderResult for () {
    fn into_render_result(self) -> RenderResult {
        Ok(Lifecycle::default())
    }
}

impl IntoRenderResult for Lifecycle {
    fn into_render_result(self) -> RenderResult {
        Ok(self)
    }
}

impl IntoRenderResult for Result<(), RenderError> {
    fn into_render_result(self) -> RenderResult {
        self.map(|()| Lifecycle::default())
    }
}

impl IntoRenderResult for Result<Lifecycle, RenderError> {
    fn into_render_result(self) -> RenderResult {
        self
    }
}

/// Explicit type tag of a component. The empty name marks a fragment.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ComponentName(Rc<str>);

impl ComponentName {
    /// Uses `name` as given, including the empty fragment name.
    pub fn fixed(name: &str) -> Self {
        ComponentName(Rc::from(name))
    }

    pub fn fragment() -> Self {
        Self::fixed("")
    }

    /// `options.name` when set, else `render_name`; an empty result is only
    /// accepted when it came from an explicit override.
    pub fn resolve(render_name: &str, options: &ComponentOptions) -> Result<Self, ComponentError> {
        match options.name.as_deref() {
            Some(name) => Ok(Self::fixed(name)),
            None if render_name.is_empty() => Err(ComponentError::EmptyName {
                render_name: render_name.to_owned(),
            }),
            None => Ok(Self::fixed(render_name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_fragment(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_rc(&self) -> &Rc<str> {
        &self.0
    }
}

impl fmt::Debug for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentOptions {
    pub name: Option<String>,
}

impl ComponentOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn fragment() -> Self {
        Self::named("")
    }
}

/// A reusable component definition: a resolved name plus a render function
/// over positional arguments `A`.
pub struct ComponentDef<A> {
    name: ComponentName,
    render: Rc<dyn Fn(&mut RenderContext<'_>, &A) -> RenderResult>,
}

impl<A: 'static> ComponentDef<A> {
    pub fn new<F, R>(render_name: &str, options: ComponentOptions, render: F) -> Result<Self, ComponentError>
    where
        F: Fn(&mut RenderContext<'_>, &A) -> R + 'static,
        R: IntoRenderResult,
    {
        let name = ComponentName::resolve(render_name, &options)?;
        Ok(Self {
            name,
            render: Rc::new(move |cx: &mut RenderContext<'_>, args: &A| {
                render(cx, args).into_render_result()
            }),
        })
    }

    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Builds a fresh node; nothing is rendered until the node is reconciled.
    pub fn call(&self, args: A) -> ComponentNode {
        let render = Rc::clone(&self.render);
        ComponentNode::new(self.name.clone(), move |cx| render(cx, &args))
    }
}

impl<A> Clone for ComponentDef<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            render: Rc::clone(&self.render),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Component,
    Text,
}

/// One tree position's description for a single pass. Rebuilt every pass.
pub struct ComponentNode {
    pub(crate) name: ComponentName,
    pub(crate) render: RenderFn,
    pub(crate) base: BaseProps,
    pub(crate) children: Vec<ComponentNode>,
    pub(crate) key: Rc<str>,
    pub(crate) metadata: Option<MetadataId>,
    pub(crate) kind: NodeKind,
    pub(crate) indexed_child_count: usize,
    text_child_count: usize,
    /// Children and props as declared before the last render; `None` until rendered.
    pub(crate) declared_children: Option<usize>,
    pub(crate) declared_base: Option<BaseProps>,
}

impl ComponentNode {
    pub fn new<F, R>(name: ComponentName, render: F) -> Self
    where
        F: Fn(&mut RenderContext<'_>) -> R + 'static,
        R: IntoRenderResult,
    {
        Self::with_render(
            name,
            Rc::new(move |cx: &mut RenderContext<'_>| render(cx).into_render_result()),
            NodeKind::Component,
        )
    }

    /// Node for a render function over positional arguments; used by `#[component]`.
    pub fn from_render<A, F, R>(name: ComponentName, args: A, render: F) -> Self
    where
        A: 'static,
        F: Fn(&mut RenderContext<'_>, &A) -> R + 'static,
        R: IntoRenderResult,
    {
        Self::new(name, move |cx| render(cx, &args))
    }

    /// A bare text child bound to a DOM text node.
    pub fn text(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self::with_render(
            ComponentName::fixed(TEXT_COMPONENT),
            Rc::new(move |cx: &mut RenderContext<'_>| -> RenderResult {
                cx.use_text_node(&text)?;
                Ok(Lifecycle::default())
            }),
            NodeKind::Text,
        )
    }

    fn with_render(name: ComponentName, render: RenderFn, kind: NodeKind) -> Self {
        Self {
            name,
            render,
            base: BaseProps::default(),
            children: Vec::new(),
            key: Rc::from(""),
            metadata: None,
            kind,
            indexed_child_count: 0,
            text_child_count: 0,
            declared_children: None,
            declared_base: None,
        }
    }

    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Resolved sibling key; empty until the node is appended to a parent.
    pub fn resolved_key(&self) -> &str {
        &self.key
    }

    pub fn base(&self) -> &BaseProps {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.base
    }

    pub fn children(&self) -> &[ComponentNode] {
        &self.children
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Appends `child`, resolving its sibling key, and returns it for further nesting.
    pub fn append(&mut self, mut child: ComponentNode) -> &mut ComponentNode {
        child.key = match child.base.key.as_deref() {
            Some(key) => Rc::from(key),
            None if child.kind == NodeKind::Text => {
                let key = format!("text_{}", self.text_child_count);
                self.text_child_count += 1;
                Rc::from(key)
            }
            None => {
                let key = format!("auto_{}_{}", self.indexed_child_count, child.name);
                self.indexed_child_count += 1;
                Rc::from(key)
            }
        };
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn append_text(&mut self, text: impl Into<String>) -> &mut ComponentNode {
        self.append(ComponentNode::text(text))
    }

    pub fn child(mut self, child: ComponentNode) -> Self {
        self.append(child);
        self
    }

    pub fn child_text(mut self, text: impl Into<String>) -> Self {
        self.append_text(text);
        self
    }

    /// Records the children and props present before render mutates the node.
    pub(crate) fn mark_declared(&mut self) {
        if self.declared_children.is_none() {
            self.declared_children = Some(self.children.len());
            self.declared_base = Some(self.base.clone());
        }
    }

    /// Same definition, props and bound position, with only the children
    /// declared before render; the render function re-appends the rest.
    pub(crate) fn shallow_clone(&self) -> Self {
        let mut clone = Self::with_render(self.name.clone(), Rc::clone(&self.render), self.kind);
        clone.base = self
            .declared_base
            .clone()
            .unwrap_or_else(|| self.base.clone());
        clone.key = Rc::clone(&self.key);
        clone.metadata = self.metadata;
        let declared = self
            .declared_children
            .unwrap_or(self.children.len())
            .min(self.children.len());
        for child in &self.children[..declared] {
            clone.append(child.shallow_clone());
        }
        clone
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            log::warn!("empty key passed to `{}`; the key is ignored", self.name);
        } else {
            self.base.key = Some(key);
        }
        self
    }

    pub fn maybe_key(self, key: Option<impl Into<String>>) -> Self {
        match key {
            Some(key) => self.key(key),
            None => {
                log::warn!("missing key passed to `{}`; the key is ignored", self.name);
                self
            }
        }
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.base.style.insert(property.into(), Some(value.into()));
        self
    }

    pub fn without_style(mut self, property: impl Into<String>) -> Self {
        self.base.style.insert(property.into(), None);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.base.attribute.insert(name.into(), Some(value.into()));
        self
    }

    pub fn without_attr(mut self, name: impl Into<String>) -> Self {
        self.base.attribute.insert(name.into(), None);
        self
    }

    pub fn class_name(mut self, classes: impl Into<ClassList>) -> Self {
        self.base.class_name.extend(classes.into().0);
        self
    }

    pub fn css_var(mut self, name: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.base.css_vars.insert(name.into(), Some(value.into()));
        self
    }

    pub fn without_css_var(mut self, name: impl Into<String>) -> Self {
        self.base.css_vars.insert(name.into(), None);
        self
    }

    pub fn on(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.base.events.insert(event.into(), Some(listener));
        self
    }

    pub fn without_event(mut self, event: impl Into<String>) -> Self {
        self.base.events.insert(event.into(), None);
        self
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("name", &self.name)
            .field("key", &&*self.key)
            .field("metadata", &self.metadata)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;

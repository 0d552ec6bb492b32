//! Declared base properties and the diffing that turns them into DOM writes.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::dom::Listener;

/// A style or CSS custom-property value.
///
/// Numbers are written with a `px` suffix; text is written verbatim, which is
/// how a caller picks any other unit.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    Text(String),
    Number(f64),
}

impl StyleValue {
    pub fn to_css(&self) -> String {
        match self {
            StyleValue::Text(text) => text.clone(),
            StyleValue::Number(number) => format!("{number}px"),
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_owned())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        StyleValue::Text(value)
    }
}

macro_rules! style_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for StyleValue {
            fn from(value: $ty) -> Self {
                StyleValue::Number(value as f64)
            }
        })*
    };
}

style_number!(f64, f32, i32, i64, u32, u64, usize);

/// An HTML attribute value. `Bool(false)` removes the attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl AttrValue {
    /// Serialized attribute value, or `None` when the attribute must be absent.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            AttrValue::Text(text) => Some(text.clone()),
            AttrValue::Number(number) => Some(number.to_string()),
            AttrValue::Bool(true) => Some("true".to_owned()),
            AttrValue::Bool(false) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

macro_rules! attr_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for AttrValue {
            fn from(value: $ty) -> Self {
                AttrValue::Number(value as f64)
            }
        })*
    };
}

attr_number!(f64, f32, i32, i64, u32, u64, usize);

/// Property name to value; a `None` value is an explicit "absent, remove it".
pub type PropMap<V> = IndexMap<String, Option<V>>;

/// Ordered class list, normalized from either a space-joined string or a list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassList(pub Vec<String>);

impl From<&str> for ClassList {
    fn from(value: &str) -> Self {
        ClassList(value.split_whitespace().map(str::to_owned).collect())
    }
}

impl From<String> for ClassList {
    fn from(value: String) -> Self {
        ClassList::from(value.as_str())
    }
}

impl From<Vec<String>> for ClassList {
    fn from(value: Vec<String>) -> Self {
        ClassList(value)
    }
}

impl From<&[&str]> for ClassList {
    fn from(value: &[&str]) -> Self {
        ClassList(value.iter().map(|class| (*class).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ClassList {
    fn from(value: [&str; N]) -> Self {
        ClassList(value.iter().map(|class| (*class).to_owned()).collect())
    }
}

/// The properties every component call accepts.
#[derive(Clone, Debug, Default)]
pub struct BaseProps {
    pub key: Option<String>,
    pub style: PropMap<StyleValue>,
    pub attribute: PropMap<AttrValue>,
    pub class_name: Vec<String>,
    pub css_vars: PropMap<StyleValue>,
    pub events: IndexMap<String, Option<Listener>>,
}

/// Presentation state flowing down to the nearest node-owning descendant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InheritedProps {
    pub style: PropMap<StyleValue>,
    pub attribute: PropMap<AttrValue>,
    pub class_name: Vec<String>,
    pub css_vars: PropMap<StyleValue>,
}

impl InheritedProps {
    /// Parent values first, own values win on collision.
    pub fn merge(&self, own: &BaseProps) -> InheritedProps {
        let mut merged = self.clone();
        for (key, value) in &own.style {
            merged.style.insert(key.clone(), value.clone());
        }
        for (key, value) in &own.attribute {
            merged.attribute.insert(key.clone(), value.clone());
        }
        for (key, value) in &own.css_vars {
            merged.css_vars.insert(key.clone(), value.clone());
        }
        merged.class_name.extend(own.class_name.iter().cloned());
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_empty()
            && self.attribute.is_empty()
            && self.class_name.is_empty()
            && self.css_vars.is_empty()
    }
}

pub(crate) struct Change<'a, V> {
    pub key: &'a str,
    pub new: Option<&'a V>,
}

/// Keys whose present value differs between the two maps.
pub(crate) fn diff_props<'a, V: PartialEq>(
    old: &'a PropMap<V>,
    new: &'a PropMap<V>,
) -> Vec<Change<'a, V>> {
    let mut changes = Vec::new();
    for (key, value) in old {
        let previous = value.as_ref();
        let next = new.get(key).and_then(Option::as_ref);
        if previous != next {
            changes.push(Change { key, new: next });
        }
    }
    for (key, value) in new {
        if old.contains_key(key) {
            continue;
        }
        if let Some(next) = value.as_ref() {
            changes.push(Change {
                key,
                new: Some(next),
            });
        }
    }
    changes
}

/// Returns `(removed, added)` class names.
pub(crate) fn diff_classes<'a>(old: &'a [String], new: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let old_set: IndexSet<&str> = old.iter().map(String::as_str).collect();
    let new_set: IndexSet<&str> = new.iter().map(String::as_str).collect();
    let removed = old_set.difference(&new_set).copied().collect();
    let added = new_set.difference(&old_set).copied().collect();
    (removed, added)
}

/// `dataSize` -> `data-size`, `maxWidth` -> `max-width`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
#[path = "tests/props_tests.rs"]
mod tests;

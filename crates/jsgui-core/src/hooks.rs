//! Handles returned by the hooks on [`RenderContext`](crate::RenderContext).
//!
//! Handles outlive the pass that produced them: they are meant to be moved
//! into event listeners. Writes take effect immediately; their visible
//! effect waits for the next pass of the owning root.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dispatch::DispatchKey;
use crate::error::HookError;
use crate::host::Location;
use crate::metadata::RootId;
use crate::runtime::RuntimeHandle;

/// Schedules a rerender of one root.
#[derive(Clone)]
pub struct Rerender {
    runtime: RuntimeHandle,
    root: RootId,
}

impl Rerender {
    pub(crate) fn new(runtime: RuntimeHandle, root: RootId) -> Self {
        Self { runtime, root }
    }

    pub fn schedule(&self) {
        self.runtime.schedule_rerender(self.root);
    }

    pub fn root(&self) -> RootId {
        self.root
    }
}

impl fmt::Debug for Rerender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rerender").field(&self.root).finish()
    }
}

/// Position-local state created by `use_state`.
pub struct State<T> {
    cell: Rc<RefCell<T>>,
    rerender: Rerender,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            rerender: self.rerender.clone(),
        }
    }
}

impl<T: 'static> State<T> {
    pub(crate) fn new(cell: Rc<RefCell<T>>, rerender: Rerender) -> Self {
        Self { cell, rerender }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.cell.borrow())
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut *self.cell.borrow_mut());
    }

    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
    }

    pub fn update_and_rerender(&self, f: impl FnOnce(&mut T)) {
        self.update(f);
        self.rerender.schedule();
    }

    pub fn set_and_rerender(&self, value: T) {
        self.set(value);
        self.rerender.schedule();
    }

    pub fn rerender_handle(&self) -> Rerender {
        self.rerender.clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("State").field(&*self.cell.borrow()).finish()
    }
}

/// Stored values are wrapped in a one-element array, `[value]`, so that
/// `null` and a missing entry stay distinguishable.
pub(crate) fn encode_stored<T: Serialize>(key: &str, value: &T) -> Result<String, HookError> {
    serde_json::to_string(&(value,)).map_err(|source| HookError::Encode {
        key: key.to_owned(),
        source,
    })
}

pub(crate) fn decode_stored<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str::<(T,)>(raw) {
        Ok((value,)) => Some(value),
        Err(err) => {
            log::debug!("ignoring unreadable stored value for `{key}`: {err}");
            None
        }
    }
}

/// A value read from the host's persistent storage during the pass.
pub struct LocalStorage<T> {
    key: String,
    value: T,
    runtime: RuntimeHandle,
}

impl<T: Serialize + DeserializeOwned + Clone + 'static> LocalStorage<T> {
    pub(crate) fn new(key: String, value: T, runtime: RuntimeHandle) -> Self {
        Self {
            key,
            value,
            runtime,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value as read when this handle was created.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn get(&self) -> T {
        self.value.clone()
    }

    /// Writes without notifying subscribers.
    pub fn set(&self, value: &T) -> Result<(), HookError> {
        self.write(value).map(|_| ())
    }

    /// Writes and, when the stored text changed, rerenders every storage subscriber.
    pub fn set_and_dispatch(&self, value: &T) -> Result<(), HookError> {
        if self.write(value)? {
            self.runtime.dispatch(&DispatchKey::Storage);
        }
        Ok(())
    }

    fn write(&self, value: &T) -> Result<bool, HookError> {
        let encoded = encode_stored(&self.key, value)?;
        self.runtime
            .with_host(|host| {
                let changed = host.storage.get_item(&self.key).as_deref() != Some(encoded.as_str());
                host.storage.set_item(&self.key, &encoded);
                changed
            })
            .ok_or(HookError::RuntimeGone)
    }
}

impl<T: Clone> Clone for LocalStorage<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorage")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

/// Navigation through the host history.
#[derive(Clone)]
pub struct Navigator {
    runtime: RuntimeHandle,
}

impl Navigator {
    pub(crate) fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    pub fn push(&self, url: &str) {
        self.navigate(url, false);
    }

    pub fn replace(&self, url: &str) {
        self.navigate(url, true);
    }

    pub fn location(&self) -> Option<Location> {
        self.runtime.with_host(|host| host.history.location())
    }

    fn navigate(&self, url: &str, replace: bool) {
        let moved = self.runtime.with_host(|host| {
            let before = host.history.location();
            if replace {
                host.history.replace_state(url);
            } else {
                host.history.push_state(url);
            }
            (before, host.history.location())
        });
        let Some((before, after)) = moved else {
            return;
        };
        log::debug!("navigate {} -> {}", before.href(), after.href());
        self.runtime.dispatch(&DispatchKey::Location);
        if before.hash != after.hash {
            self.runtime.dispatch(&DispatchKey::LocationHash);
        }
    }
}

/// Field name to message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(IndexMap<String, String>);

impl ValidationErrors {
    pub fn set(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationState {
    pub errors: ValidationErrors,
    pub did_validate: bool,
}

/// Runs the collector registered with `use_validate`.
pub struct Validator {
    state: Rc<RefCell<ValidationState>>,
    collector: Rc<dyn Fn(&mut ValidationErrors)>,
    rerender: Rerender,
}

impl Clone for Validator {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            collector: Rc::clone(&self.collector),
            rerender: self.rerender.clone(),
        }
    }
}

impl Validator {
    pub(crate) fn new(
        state: Rc<RefCell<ValidationState>>,
        collector: Rc<dyn Fn(&mut ValidationErrors)>,
        rerender: Rerender,
    ) -> Self {
        Self {
            state,
            collector,
            rerender,
        }
    }

    /// Collects errors into the position's state; rerenders when any were found.
    pub fn validate(&self) -> bool {
        let mut errors = ValidationErrors::default();
        (self.collector)(&mut errors);
        let valid = errors.is_empty();
        {
            let mut state = self.state.borrow_mut();
            state.errors = errors;
            state.did_validate = true;
        }
        if !valid {
            self.rerender.schedule();
        }
        valid
    }

    pub fn state(&self) -> ValidationState {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;

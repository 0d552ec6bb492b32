#![doc = r"Component tree, reconciler and hook runtime for the jsgui framework."]

extern crate self as jsgui_core;

pub mod collections;
pub mod component;
pub mod context;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod hooks;
pub mod host;
pub mod metadata;
pub mod platform;
pub mod props;
mod reconcile;
pub mod runtime;

pub use component::{
    ComponentDef, ComponentName, ComponentNode, ComponentOptions, IntoRenderResult, Lifecycle,
    MountCallback, RenderResult, UnmountCallback,
};
pub use context::RenderContext;
pub use dispatch::{DispatchKey, MediaQuery};
pub use dom::{Dom, DomNodeId, Event, Listener, MemoryDom, MutationStats};
pub use error::{ComponentError, DomError, HookError, RenderError};
pub use hooks::{
    LocalStorage, Navigator, Rerender, State, ValidationErrors, ValidationState, Validator,
};
pub use host::{
    History, Host, Location, MediaQueries, MemoryHistory, MemoryMedia, MemoryStorage, Storage,
    WindowSize,
};
pub use metadata::{MetadataId, RootId};
pub use platform::{Clock, DefaultScheduler, FrameScheduler};
pub use props::{kebab_case, AttrValue, BaseProps, ClassList, InheritedProps, PropMap, StyleValue};
pub use runtime::{Diagnostics, Runtime, RuntimeBuilder, RuntimeHandle, RuntimeOptions};

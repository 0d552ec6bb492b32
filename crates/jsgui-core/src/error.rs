use thiserror::Error;

use crate::dom::DomNodeId;
use crate::metadata::{MetadataId, RootId};

/// Failures reported by a [`Dom`](crate::Dom) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("dom node {id} missing")]
    Missing { id: DomNodeId },
    #[error("dom node {id} is a text node")]
    NotAnElement { id: DomNodeId },
    #[error("dom node {anchor} is not a child of {parent}")]
    NotAChild { parent: DomNodeId, anchor: DomNodeId },
    #[error("dom node {id} cannot be inserted into itself or a descendant")]
    Cycle { id: DomNodeId },
}

/// Construction-time failures of a component definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("component name cannot be empty (render function `{render_name}`); use an explicit empty name for fragments")]
    EmptyName { render_name: String },
}

/// Anything that aborts a reconciliation pass.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("metadata {0:?} is not reachable from a live root")]
    StaleMetadata(MetadataId),
    #[error("root {0:?} is not mounted")]
    UnknownRoot(RootId),
    #[error("runtime was dropped")]
    RuntimeGone,
    #[error("render of `{component}` failed: {message}")]
    Failed { component: String, message: String },
}

impl RenderError {
    /// Builds the error a render function returns to abort the pass.
    pub fn failed(component: impl Into<String>, message: impl std::fmt::Display) -> Self {
        RenderError::Failed {
            component: component.into(),
            message: message.to_string(),
        }
    }
}

/// Failures of hook handles used outside a pass.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to encode value for storage key `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("runtime was dropped")]
    RuntimeGone,
}

//! Element components and the router, built on the jsgui core runtime.

pub use jsgui_core::{ComponentNode, RenderContext};
pub use jsgui_macros::component;

mod components;
mod router;

pub use components::{
    button, button_with, div, element, fragment, span, span_with, ButtonProps, SpanProps,
};
pub use router::{
    match_route, router, strip_index_html, Access, ContentWrapper, NavigationEntry, PageWrapper,
    PageWrapperProps, Route, RouteComponent, RouteError, RouteMatch, RouteOutcome, RouteParams,
    RouteTable, RouterProps,
};

//! Path-based routing.
//!
//! Route templates are regular expression fragments in which `:name`
//! segments capture one path segment each. Matching is a pure function of
//! the path, the route table and the caller's [`Access`]; the [`router`]
//! component wires it to the current location.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use jsgui_core::{ComponentNode, RenderContext};
use regex::Regex;
use thiserror::Error;

use crate::component;
use crate::components::{div, fragment, span};

const PLACEHOLDER: &str = r":([^/]+)";
const INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route template `{path}`: {source}")]
    Template {
        path: String,
        #[source]
        source: regex::Error,
    },
}

pub type RouteComponent = Rc<dyn Fn(&RouteParams) -> ComponentNode>;
pub type PageWrapper = Rc<dyn Fn(PageWrapperProps) -> ComponentNode>;
pub type ContentWrapper = Rc<dyn Fn() -> ComponentNode>;

/// Parameters captured from `:name` segments, in template order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteParams(IndexMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[derive(Clone)]
pub struct Route {
    pub path: String,
    /// Link target used for navigation when `path` is a template.
    pub default_path: Option<String>,
    pub component: RouteComponent,
    /// The caller needs at least one of these; empty means public.
    pub roles: Vec<String>,
    /// Render inside the page wrapper (the default) or directly in a content wrapper.
    pub wrapper: bool,
    pub show_in_navigation: bool,
    pub label: Option<String>,
    pub group: Option<String>,
}

impl Route {
    pub fn new(
        path: impl Into<String>,
        component: impl Fn(&RouteParams) -> ComponentNode + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            default_path: None,
            component: Rc::new(component),
            roles: Vec::new(),
            wrapper: true,
            show_in_navigation: false,
            label: None,
            group: None,
        }
    }

    /// A route used in place of a match; it matches any path.
    pub fn fallback(component: impl Fn(&RouteParams) -> ComponentNode + 'static) -> Self {
        Self::new(".*", component)
    }

    pub fn default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn without_wrapper(mut self) -> Self {
        self.wrapper = false;
        self
    }

    /// Lists the route in [`RouteTable::navigation`] under `label`.
    pub fn in_navigation(mut self, label: impl Into<String>) -> Self {
        self.show_in_navigation = true;
        self.label = Some(label.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn render(&self, params: &RouteParams) -> ComponentNode {
        (self.component)(params)
    }

    fn admits(&self, access: &Access) -> bool {
        self.roles.is_empty() || access.roles.iter().any(|role| self.roles.contains(role))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("roles", &self.roles)
            .field("wrapper", &self.wrapper)
            .finish_non_exhaustive()
    }
}

struct CompiledRoute {
    route: Route,
    expr: Regex,
}

/// A link for a route that asked to be listed in navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationEntry<'a> {
    pub label: &'a str,
    pub path: &'a str,
    pub group: Option<&'a str>,
}

/// Routes compiled once, ordered so literal paths are tried before templates
/// that would also match them.
pub struct RouteTable {
    declared: Vec<Route>,
    compiled: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteError> {
        let placeholder = Regex::new(PLACEHOLDER).map_err(|source| RouteError::Template {
            path: PLACEHOLDER.to_owned(),
            source,
        })?;
        let mut keyed = Vec::with_capacity(routes.len());
        for route in &routes {
            let pattern = placeholder.replace_all(&route.path, "(?P<${1}>[^/]*)");
            let expr = Regex::new(&format!("^{pattern}$")).map_err(|source| RouteError::Template {
                path: route.path.clone(),
                source,
            })?;
            let specificity = placeholder.replace_all(&route.path, "").into_owned();
            keyed.push((
                specificity,
                CompiledRoute {
                    route: route.clone(),
                    expr,
                },
            ));
        }
        keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
        log::debug!("compiled {} route(s)", keyed.len());
        Ok(Self {
            declared: routes,
            compiled: keyed.into_iter().map(|(_, compiled)| compiled).collect(),
        })
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.declared
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// The first route, in match order, whose template matches all of `path`.
    pub fn find(&self, path: &str) -> Option<(&Route, RouteParams)> {
        self.compiled.iter().find_map(|compiled| {
            let captures = compiled.expr.captures(path)?;
            let params = compiled
                .expr
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    let value = captures.name(name)?;
                    Some((name.to_owned(), value.as_str().to_owned()))
                })
                .collect();
            Some((&compiled.route, RouteParams(params)))
        })
    }

    pub fn navigation(&self) -> Vec<NavigationEntry<'_>> {
        self.declared
            .iter()
            .filter(|route| route.show_in_navigation)
            .map(|route| {
                let path = route.default_path.as_deref().unwrap_or(&route.path);
                NavigationEntry {
                    label: route.label.as_deref().unwrap_or(path),
                    path,
                    group: route.group.as_deref(),
                }
            })
            .collect()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.compiled.iter().map(|compiled| compiled.expr.as_str()))
            .finish()
    }
}

/// Who is asking for a route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Access {
    pub roles: Vec<String>,
    pub logged_in: bool,
}

impl Access {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            logged_in: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Matched,
    /// A template matched but a logged-in caller lacks every required role.
    Unauthorized,
    /// A template matched a role-restricted route and the caller is anonymous.
    NotLoggedIn,
    NotFound,
}

#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The route whose template matched, even when access was refused.
    pub route: Option<&'a Route>,
    pub params: RouteParams,
    pub outcome: RouteOutcome,
}

pub fn match_route<'a>(path: &str, table: &'a RouteTable, access: &Access) -> RouteMatch<'a> {
    let Some((route, params)) = table.find(path) else {
        return RouteMatch {
            route: None,
            params: RouteParams::default(),
            outcome: RouteOutcome::NotFound,
        };
    };
    let outcome = if route.admits(access) {
        RouteOutcome::Matched
    } else if access.logged_in {
        RouteOutcome::Unauthorized
    } else {
        RouteOutcome::NotLoggedIn
    };
    RouteMatch {
        route: Some(route),
        params,
        outcome,
    }
}

/// Drops a trailing `index.html`, keeping the directory's slash.
pub fn strip_index_html(path: &str) -> &str {
    match path.strip_suffix(INDEX_FILE) {
        Some(directory) if directory.ends_with('/') => directory,
        _ => path,
    }
}

/// What the page wrapper receives for the route being shown.
#[derive(Clone)]
pub struct PageWrapperProps {
    pub routes: Rc<RouteTable>,
    pub current_route: Route,
    pub params: RouteParams,
    pub content_wrapper: ContentWrapper,
}

impl PageWrapperProps {
    /// The content wrapper holding the current route's component.
    pub fn content(&self) -> ComponentNode {
        (self.content_wrapper)().child(self.current_route.render(&self.params))
    }
}

#[derive(Clone)]
pub struct RouterProps {
    pub routes: Rc<RouteTable>,
    pub page_wrapper: PageWrapper,
    pub content_wrapper: ContentWrapper,
    pub access: Access,
    pub not_logged_in: Route,
    pub not_found: Route,
    pub unauthorized: Route,
}

impl RouterProps {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: Rc::new(routes),
            page_wrapper: Rc::new(|props: PageWrapperProps| fragment().child(props.content())),
            content_wrapper: Rc::new(|| div().class_name("pageContent")),
            access: Access::default(),
            not_logged_in: Route::fallback(|_| fragment()),
            not_found: Route::fallback(|_| span("404 Not found")),
            unauthorized: Route::fallback(|_| fragment()),
        }
    }

    pub fn page_wrapper(mut self, wrapper: impl Fn(PageWrapperProps) -> ComponentNode + 'static) -> Self {
        self.page_wrapper = Rc::new(wrapper);
        self
    }

    pub fn content_wrapper(mut self, wrapper: impl Fn() -> ComponentNode + 'static) -> Self {
        self.content_wrapper = Rc::new(wrapper);
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn not_logged_in(mut self, route: Route) -> Self {
        self.not_logged_in = route;
        self
    }

    pub fn not_found(mut self, route: Route) -> Self {
        self.not_found = route;
        self
    }

    pub fn unauthorized(mut self, route: Route) -> Self {
        self.unauthorized = route;
        self
    }

    fn resolve(&self, path: &str) -> (Route, RouteParams) {
        let found = match_route(path, &self.routes, &self.access);
        match (found.outcome, found.route) {
            (RouteOutcome::Matched, Some(route)) => (route.clone(), found.params),
            (RouteOutcome::Unauthorized, _) => (self.unauthorized.clone(), found.params),
            (RouteOutcome::NotLoggedIn, _) => (self.not_logged_in.clone(), found.params),
            _ => {
                log::warn!("route `{path}` not found");
                (self.not_found.clone(), RouteParams::default())
            }
        }
    }
}

impl fmt::Debug for RouterProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterProps")
            .field("routes", &self.routes)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Renders the route matching the current location.
#[component]
pub fn router(cx: &mut RenderContext<'_>, props: RouterProps) {
    let location = cx.use_location();
    let path = strip_index_html(&location.pathname);
    let (route, params) = props.resolve(path);
    log::trace!("routing `{path}` to `{}`", route.path);
    if route.wrapper {
        cx.append((props.page_wrapper)(PageWrapperProps {
            routes: Rc::clone(&props.routes),
            current_route: route,
            params,
            content_wrapper: Rc::clone(&props.content_wrapper),
        }));
    } else {
        let content = (props.content_wrapper)().child(route.render(&params));
        cx.append(content);
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;

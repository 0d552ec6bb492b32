//! External resources the hooks read from: persistent storage, media
//! queries, and navigation history.
//!
//! Each trait has an in-memory implementation whose clones share state, so
//! two runtimes built from clones of one [`MemoryStorage`] behave like two
//! browsing contexts over the same origin.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

pub trait MediaQueries {
    fn matches(&self, query: &str) -> bool;
}

pub trait History {
    fn location(&self) -> Location;
    fn push_state(&self, url: &str);
    fn replace_state(&self, url: &str);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl Location {
    /// Splits `"/path?query#hash"`; `search` keeps its `?` and `hash` its `#`.
    pub fn parse(url: &str) -> Self {
        let (rest, hash) = match url.find('#') {
            Some(index) => (&url[..index], &url[index..]),
            None => (url, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(index) => (&rest[..index], &rest[index..]),
            None => (rest, ""),
        };
        let pathname = if pathname.is_empty() { "/" } else { pathname };
        Self {
            pathname: pathname.to_owned(),
            search: search.to_owned(),
            hash: hash.to_owned(),
        }
    }

    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

impl WindowSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<IndexMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().shift_remove(key);
    }
}

/// Media queries answered from a table; unknown queries do not match.
#[derive(Clone, Debug, Default)]
pub struct MemoryMedia {
    matches: Rc<RefCell<IndexMap<String, bool>>>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, query: &str, matches: bool) {
        self.matches.borrow_mut().insert(query.to_owned(), matches);
    }
}

impl MediaQueries for MemoryMedia {
    fn matches(&self, query: &str) -> bool {
        self.matches.borrow().get(query).copied().unwrap_or(false)
    }
}

#[derive(Debug)]
struct HistoryEntries {
    entries: Vec<String>,
    index: usize,
}

#[derive(Clone, Debug)]
pub struct MemoryHistory {
    state: Rc<RefCell<HistoryEntries>>,
}

impl MemoryHistory {
    pub fn new(initial_url: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(HistoryEntries {
                entries: vec![initial_url.to_owned()],
                index: 0,
            })),
        }
    }

    /// Moves back one entry; returns `false` at the start of history.
    pub fn back(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.index == 0 {
            return false;
        }
        state.index -= 1;
        true
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        let state = self.state.borrow();
        Location::parse(&state.entries[state.index])
    }

    fn push_state(&self, url: &str) {
        let mut state = self.state.borrow_mut();
        let next = state.index + 1;
        state.entries.truncate(next);
        state.entries.push(url.to_owned());
        state.index = next;
    }

    fn replace_state(&self, url: &str) {
        let mut state = self.state.borrow_mut();
        let index = state.index;
        state.entries[index] = url.to_owned();
    }
}

/// The bundle of host services a runtime reads from.
pub struct Host {
    pub storage: Box<dyn Storage>,
    pub media: Box<dyn MediaQueries>,
    pub history: Box<dyn History>,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            storage: Box::new(MemoryStorage::new()),
            media: Box::new(MemoryMedia::new()),
            history: Box::new(MemoryHistory::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_parse_splits_search_and_hash() {
        let location = Location::parse("/docs/inputs?tab=2#number");
        assert_eq!(location.pathname, "/docs/inputs");
        assert_eq!(location.search, "?tab=2");
        assert_eq!(location.hash, "#number");
        assert_eq!(location.href(), "/docs/inputs?tab=2#number");
        assert_eq!(Location::parse("#top").pathname, "/");
    }

    #[test]
    fn storage_clones_share_items() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set_item("x", "[5]");
        assert_eq!(b.get_item("x").as_deref(), Some("[5]"));
        b.remove_item("x");
        assert_eq!(a.get_item("x"), None);
    }

    #[test]
    fn history_push_truncates_forward_entries() {
        let history = MemoryHistory::new("/a");
        history.push_state("/b");
        history.push_state("/c");
        assert!(history.back());
        history.push_state("/d");
        assert_eq!(history.len(), 3);
        assert_eq!(history.location().pathname, "/d");
        history.replace_state("/e#x");
        assert_eq!(history.location().hash, "#x");
    }
}

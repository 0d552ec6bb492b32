//! Map and hasher choices, switchable to `std` with the `std-hash` feature.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::metadata::MetadataId;

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}

/// Unseeded, so equal dependencies hash equally across passes.
#[cfg(feature = "std-hash")]
type DependencyHasher = std::collections::hash_map::DefaultHasher;

#[cfg(not(feature = "std-hash"))]
type DependencyHasher = ahash::AHasher;

/// Child positions of one metadata entry, keyed by the resolved sibling key.
pub(crate) type ChildKeyMap = map::HashMap<Rc<str>, MetadataId>;

/// Key stored on a bound node for its `use_node_with` dependency.
pub fn dependency_key<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DependencyHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

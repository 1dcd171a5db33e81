//! sable-util - Persistent Collections and Foundation Types
//!
//! This crate provides the immutable data structures underneath the Sable
//! abstract-value lattice. The central types are [`PersistentSet`] and
//! [`PersistentMap`]: structurally shared collections with value semantics,
//! used for object-label sets, string refinements, and lattice-valued maps.
//!
//! Design principles:
//!
//! 1. VALUE SEMANTICS
//!    Two collections with the same elements are equal and hash equally,
//!    regardless of how they were built or how their internal trees are
//!    shaped.
//!
//! 2. STRUCTURAL SHARING
//!    Every "mutating" operation returns a new logical collection; the old
//!    one is untouched, and unchanged subtrees are shared. Cloning is O(1).
//!
//! 3. DETERMINISM
//!    All hashing goes through `FxHasher`, which is unseeded, so iteration
//!    order and hash codes are reproducible across runs.

mod persistent;

pub use persistent::{PersistentMap, PersistentSet};

/// Join capability for lattice elements.
///
/// `a.join(&b)` produces the least upper bound of `a` and `b`. Maps whose
/// values implement this trait gain [`PersistentMap::weak_update`] and
/// [`PersistentMap::join`].
pub trait Join {
    fn join(&self, other: &Self) -> Self;
}

// Re-export commonly used types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
pub use rustc_hash::FxHasher;

/// The unseeded hasher factory used by every collection in this workspace.
pub type FxBuildHasher = std::hash::BuildHasherDefault<FxHasher>;

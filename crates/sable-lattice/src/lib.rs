//! sable-lattice - The Abstract Value Lattice
//!
//! This crate is the heart of the Sable analyzer: the lattice of abstract
//! values that approximate what a program expression may evaluate to at a
//! program point. The analyzer's transfer functions combine values with
//! [`Value::join`], narrow them with the restriction operators, and compare
//! them with the strict/loose equality restrictions; the solver relies on
//! [`Value::join_widening`] for termination.
//!
//! # Interning
//!
//! Every distinct value exists exactly once: constructors canonicalize
//! through a process-wide pool ([`Canonicalizer`]), so equality is pointer
//! identity and hash codes are precomputed. See the `canonical` module for
//! the contract around [`reset`].
//!
//! # Collaborators
//!
//! The lattice consumes opaque tokens from the embedding analyzer: object
//! labels, property references, source locations, partitioning tokens. It
//! never interprets program syntax, never allocates abstract objects, and
//! performs no I/O.
//!
//! # Example
//!
//! ```
//! use sable_lattice::Value;
//!
//! sable_lattice::init();
//! let v = Value::make_str("foo").join(&Value::make_str("bar"));
//! assert!(v.is_maybe_str("foo"));
//! assert!(v.is_maybe_str("bar"));
//! assert!(!v.is_maybe_str("baz"));
//! ```

mod canonical;
mod error;
mod label;
mod options;
mod partition;
mod pkey;
mod strings;
mod value;

mod edge_cases;

pub use canonical::{canonicalizer, Canonicalizer, CanonicalizerStats};
pub use error::AnalysisError;
pub use label::{
    HostApi, LabelKind, ObjectLabel, ObjectProperty, PropertyKey, SourceLocation, Summarized,
};
pub use options::{Options, DEFAULT_STRING_SETS_BOUND};
pub use partition::{FreeVariablePartitioning, PartitionToken};
pub use pkey::PKey;
pub use value::Value;

pub use strings::{
    contains_non_number_characters, is_array_index, is_identifier, is_identifier_parts,
    is_numeric, is_other_identifier_parts, numeric_value, shared_prefix,
};

/// Builds the canonicalization pool and the singleton constants.
///
/// Construction is lazy, so calling this is optional; it exists to give
/// embedders a deterministic initialization point before spawning analyses.
pub fn init() {
    canonical::pool().singletons();
}

/// Clears the canonicalization pool and rebuilds the singleton constants on
/// next use. Values obtained before the reset must not be retained: they
/// compare unequal to equal values interned afterwards.
pub fn reset() {
    canonical::pool().reset();
}

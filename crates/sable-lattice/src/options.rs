//! Analysis options consumed by the lattice.
//!
//! A flat bag of switches, queried once per operation that needs them. The
//! bag is thread-scoped: the lattice is single-threaded by contract, and
//! per-thread storage lets several analyses (or test threads) run in one
//! process with independent settings and no lock on the query path.

use std::cell::Cell;

/// Default cap on the size of an included-string enumeration before it is
/// widened away.
pub const DEFAULT_STRING_SETS_BOUND: usize = 100;

/// Lattice configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Run representation-invariant checks and polymorphism asserts on
    /// every canonicalization.
    pub debug_or_test_enabled: bool,

    /// Reject any polymorphic value passed through the canonicalizer.
    pub polymorphic_disabled: bool,

    /// Disable the included-strings refinement entirely.
    pub no_string_sets: bool,

    /// Allow empty (bottom) values to propagate without assertion failures.
    pub propagate_dead_flow: bool,

    /// Cap on `included_strings` size; joins growing past it widen the
    /// enumeration away.
    pub string_sets_bound: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug_or_test_enabled: cfg!(debug_assertions),
            polymorphic_disabled: false,
            no_string_sets: false,
            propagate_dead_flow: false,
            string_sets_bound: DEFAULT_STRING_SETS_BOUND,
        }
    }
}

thread_local! {
    static CURRENT: Cell<Options> = Cell::new(Options::default());
}

impl Options {
    /// The options in effect on this thread.
    pub fn get() -> Options {
        CURRENT.with(Cell::get)
    }

    /// Replaces this thread's options.
    pub fn set(options: Options) {
        CURRENT.with(|c| c.set(options));
    }

    /// Runs `f` with `options` in effect, restoring the previous options
    /// afterwards. Intended for tests and scoped reconfiguration.
    pub fn with<R>(options: Options, f: impl FnOnce() -> R) -> R {
        let previous = Options::get();
        Options::set(options);
        let result = f();
        Options::set(previous);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = Options::default();
        assert!(!o.polymorphic_disabled);
        assert!(!o.no_string_sets);
        assert!(!o.propagate_dead_flow);
        assert_eq!(o.string_sets_bound, DEFAULT_STRING_SETS_BOUND);
    }

    #[test]
    fn test_with_restores() {
        let before = Options::get();
        let inner = Options::with(
            Options {
                no_string_sets: true,
                ..before
            },
            Options::get,
        );
        assert!(inner.no_string_sets);
        assert_eq!(Options::get(), before);
    }
}

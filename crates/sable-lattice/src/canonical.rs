//! Canonicalization pool.
//!
//! Every freshly constructed value (and every object-label set and string
//! set embedded in one) is replaced by the unique interned representative of
//! its structural equivalence class. After interning, value equality is
//! reference identity and hashing reads a precomputed code, so the hot paths
//! of the analyzer never compare values field by field.
//!
//! The pool is keyed by a structural-equality wrapper while [`Value`]
//! itself compares by pointer: the wrapper type is the moment-of-interning
//! equality mode made explicit. Lookups are lock-free via `DashMap`; the
//! only lock in this module guards the singleton-cache rebuild.
//!
//! # Thread Safety
//!
//! The pool is fully thread-safe (`Sync + Send`). Several analyses may
//! intern concurrently; canonical representatives are process-wide.
//!
//! # Resets
//!
//! [`Canonicalizer::reset`] clears the pool and the singleton cache. Values
//! obtained before a reset are foreign to values interned after it: they
//! compare unequal by reference even when structurally equal. Callers must
//! not retain values across a reset.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use sable_util::PersistentSet;

use crate::error::{fatal, AnalysisError};
use crate::label::ObjectLabel;
use crate::options::Options;
use crate::value::{check_invariants, Value, ValueData, ValueFlags};

/// Pool key: compares by field-for-field structure, hashes by the
/// precomputed code. Distinct from `Value` equality on purpose.
#[derive(Clone)]
struct Structural(Arc<ValueData>);

impl PartialEq for Structural {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for Structural {}

impl Hash for Structural {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

/// Pool statistics for profiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalizerStats {
    /// Distinct values interned.
    pub values: usize,
    /// Distinct object-label sets interned.
    pub label_sets: usize,
    /// Distinct string sets interned.
    pub string_sets: usize,
    /// Lookups that found an existing representative.
    pub hits: usize,
    /// Lookups that inserted a new representative.
    pub misses: usize,
}

/// Eagerly shared representatives for the common constants.
///
/// Rebuilt lazily after every [`Canonicalizer::reset`].
pub(crate) struct Singletons {
    pub(crate) none: Value,
    pub(crate) undef: Value,
    pub(crate) null: Value,
    pub(crate) bool_true: Value,
    pub(crate) bool_false: Value,
    pub(crate) bool_any: Value,
    pub(crate) str_any: Value,
    pub(crate) str_uint: Value,
    pub(crate) str_other_num: Value,
    pub(crate) str_numeric: Value,
    pub(crate) str_not_numeric: Value,
    pub(crate) str_not_uint: Value,
    pub(crate) str_ident: Value,
    pub(crate) str_json: Value,
    pub(crate) num_any: Value,
    pub(crate) num_uint: Value,
    pub(crate) num_uint_pos: Value,
    pub(crate) num_other: Value,
    pub(crate) num_not_nan_inf: Value,
    pub(crate) num_nan: Value,
    pub(crate) num_inf: Value,
    pub(crate) absent: Value,
    pub(crate) unknown: Value,
}

impl Singletons {
    fn build(pool: &Canonicalizer) -> Singletons {
        let mk = |flags: ValueFlags| pool.canonicalize(ValueData::with_flags(flags));
        Singletons {
            none: mk(ValueFlags::empty()),
            undef: mk(ValueFlags::UNDEF),
            null: mk(ValueFlags::NULL),
            bool_true: mk(ValueFlags::BOOL_TRUE),
            bool_false: mk(ValueFlags::BOOL_FALSE),
            bool_any: mk(ValueFlags::BOOL),
            str_any: mk(ValueFlags::STR_CATEGORIES),
            str_uint: mk(ValueFlags::STR_UINT),
            str_other_num: mk(ValueFlags::STR_OTHERNUM),
            str_numeric: mk(ValueFlags::STR_UINT | ValueFlags::STR_OTHERNUM),
            str_not_numeric: mk(
                ValueFlags::STR_IDENTIFIER
                    | ValueFlags::STR_OTHERIDENTIFIERPARTS
                    | ValueFlags::STR_OTHER,
            ),
            str_not_uint: mk(
                ValueFlags::STR_OTHERNUM
                    | ValueFlags::STR_IDENTIFIER
                    | ValueFlags::STR_OTHERIDENTIFIERPARTS
                    | ValueFlags::STR_OTHER,
            ),
            str_ident: mk(ValueFlags::STR_IDENTIFIER),
            str_json: mk(ValueFlags::STR_JSON),
            num_any: mk(ValueFlags::NUM),
            num_uint: mk(ValueFlags::NUM_UINT),
            num_uint_pos: mk(ValueFlags::NUM_UINT_POS),
            num_other: mk(ValueFlags::NUM_OTHER),
            num_not_nan_inf: mk(ValueFlags::NUM_NOT_NAN_INF),
            num_nan: mk(ValueFlags::NUM_NAN),
            num_inf: mk(ValueFlags::NUM_INF),
            absent: mk(ValueFlags::ABSENT),
            unknown: mk(ValueFlags::UNKNOWN),
        }
    }
}

/// The interning service.
pub struct Canonicalizer {
    values: DashMap<Structural, Value, RandomState>,
    label_sets: DashMap<PersistentSet<ObjectLabel>, PersistentSet<ObjectLabel>, RandomState>,
    string_sets: DashMap<PersistentSet<String>, PersistentSet<String>, RandomState>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    singletons: RwLock<Option<Arc<Singletons>>>,
}

impl Canonicalizer {
    pub fn new() -> Self {
        Self {
            values: DashMap::with_capacity_and_hasher(1024, RandomState::new()),
            label_sets: DashMap::with_hasher(RandomState::new()),
            string_sets: DashMap::with_hasher(RandomState::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            singletons: RwLock::new(None),
        }
    }

    /// Interns `data`, returning the canonical representative.
    ///
    /// Runs the representation-invariant checks when debug mode is on,
    /// rejects polymorphic values when they are disabled, and canonicalizes
    /// the embedded label and string sets first so set equality inside the
    /// pool hits the shared-structure fast path.
    pub(crate) fn canonicalize(&self, mut data: ValueData) -> Value {
        let options = Options::get();
        if options.debug_or_test_enabled {
            check_invariants(&data);
        }
        if options.polymorphic_disabled && data.var.is_some() {
            fatal(AnalysisError::PolymorphicDisabled);
        }
        if let Some(labels) = data.object_labels.take() {
            data.object_labels = Some(self.canonicalize_set(labels));
        }
        if let Some(getters) = data.getters.take() {
            data.getters = Some(self.canonicalize_set(getters));
        }
        if let Some(setters) = data.setters.take() {
            data.setters = Some(self.canonicalize_set(setters));
        }
        if let Some(excluded) = data.excluded_strings.take() {
            data.excluded_strings = Some(self.canonicalize_string_set(excluded));
        }
        if let Some(included) = data.included_strings.take() {
            data.included_strings = Some(self.canonicalize_string_set(included));
        }
        data.hash = data.compute_hash();

        let candidate = Arc::new(data);
        match self.values.entry(Structural(candidate.clone())) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let value = Value(candidate);
                entry.insert(value.clone());
                value
            }
        }
    }

    /// Interns an object-label set.
    pub fn canonicalize_set(
        &self,
        set: PersistentSet<ObjectLabel>,
    ) -> PersistentSet<ObjectLabel> {
        Self::intern_set(&self.label_sets, set)
    }

    /// Interns a string set.
    pub fn canonicalize_string_set(&self, set: PersistentSet<String>) -> PersistentSet<String> {
        Self::intern_set(&self.string_sets, set)
    }

    fn intern_set<T>(
        pool: &DashMap<PersistentSet<T>, PersistentSet<T>, RandomState>,
        set: PersistentSet<T>,
    ) -> PersistentSet<T>
    where
        T: Hash + Eq + Clone,
    {
        match pool.entry(set.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                entry.insert(set.clone());
                set
            }
        }
    }

    /// The shared constants, built on first use after construction or reset.
    pub(crate) fn singletons(&self) -> Arc<Singletons> {
        if let Some(cache) = self.singletons.read().as_ref() {
            return cache.clone();
        }
        let mut slot = self.singletons.write();
        if let Some(cache) = slot.as_ref() {
            return cache.clone();
        }
        let cache = Arc::new(Singletons::build(self));
        *slot = Some(cache.clone());
        cache
    }

    /// Number of distinct values interned.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> CanonicalizerStats {
        CanonicalizerStats {
            values: self.values.len(),
            label_sets: self.label_sets.len(),
            string_sets: self.string_sets.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Clears the pool and the singleton cache.
    ///
    /// Values interned before the reset become foreign identities; callers
    /// must drop them.
    pub fn reset(&self) {
        let mut cache = self.singletons.write();
        *cache = None;
        self.values.clear();
        self.label_sets.clear();
        self.string_sets.clear();
        let hits = self.hits.swap(0, Ordering::Relaxed);
        let misses = self.misses.swap(0, Ordering::Relaxed);
        debug!(hits, misses, "canonicalization pool reset");
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide pool used by all `Value` constructors.
static POOL: LazyLock<Canonicalizer> = LazyLock::new(Canonicalizer::new);

pub(crate) fn pool() -> &'static Canonicalizer {
    &POOL
}

/// The process-wide canonicalizer.
pub fn canonicalizer() -> &'static Canonicalizer {
    &POOL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_referential() {
        let a = Value::make_str("canonical_probe");
        let b = Value::make_str("canonical_probe");
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn test_hit_miss_accounting() {
        let local = Canonicalizer::new();
        let before = local.stats();
        assert_eq!(before.hits + before.misses, 0);
        let mut data = ValueData::bottom();
        data.num = Some(17.25);
        local.canonicalize(data.clone());
        local.canonicalize(data);
        let after = local.stats();
        assert_eq!(after.misses, 1);
        assert_eq!(after.hits, 1);
        assert_eq!(after.values, 1);
    }

    #[test]
    fn test_set_interning_shares_representatives() {
        let local = Canonicalizer::new();
        let a: PersistentSet<String> =
            ["x".to_string(), "y".to_string()].into_iter().collect();
        let b: PersistentSet<String> =
            ["y".to_string(), "x".to_string()].into_iter().collect();
        let ca = local.canonicalize_string_set(a);
        let cb = local.canonicalize_string_set(b);
        assert_eq!(ca, cb);
        assert_eq!(local.stats().string_sets, 1);
    }

    #[test]
    fn test_reset_clears_and_rebuilds() {
        let local = Canonicalizer::new();
        let first = local.singletons();
        let mut data = ValueData::bottom();
        data.num = Some(3.0);
        local.canonicalize(data.clone());
        assert!(local.len() > 0);

        local.reset();
        assert_eq!(local.len(), 0);
        assert_eq!(local.stats().hits + local.stats().misses, 0);

        // the cache rebuilds with fresh identities
        let second = local.singletons();
        assert!(!Arc::ptr_eq(&first.none.0, &second.none.0));
        let reinterned = local.canonicalize(data);
        assert_eq!(reinterned.get_num(), 3.0);
    }
}

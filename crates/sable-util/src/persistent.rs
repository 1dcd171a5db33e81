//! Persistent set and map with structural sharing.
//!
//! Thin wrappers around `im`'s hash array mapped tries. The wrappers pin the
//! hasher to `FxHasher` (deterministic, unseeded), add order-independent
//! `Hash` implementations so whole collections can be interned, and expose
//! the operation vocabulary the lattice needs (`union`, `subtract`,
//! `intersect`, `remove_if`, `weak_update`, per-key `join`).
//!
//! Every operation that changes content returns a new collection; the
//! receiver is never mutated. Cloning is O(1) and unchanged subtrees are
//! shared between the old and new collection.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::{FxBuildHasher, Join};

/// An immutable, structurally shared set with value semantics.
pub struct PersistentSet<T>
where
    T: Hash + Eq + Clone,
{
    inner: im::HashSet<T, FxBuildHasher>,
}

impl<T: Hash + Eq + Clone> PersistentSet<T> {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            inner: im::HashSet::default(),
        }
    }

    /// A set with exactly one element.
    pub fn unit(value: T) -> Self {
        Self::empty().add(value)
    }

    /// Returns a new set that also contains `value`.
    pub fn add(&self, value: T) -> Self {
        let mut inner = self.inner.clone();
        inner.insert(value);
        Self { inner }
    }

    /// Returns a new set without `value`.
    pub fn remove(&self, value: &T) -> Self {
        let mut inner = self.inner.clone();
        inner.remove(value);
        Self { inner }
    }

    /// Returns a new set extended with every element of `values`.
    pub fn add_all<I: IntoIterator<Item = T>>(&self, values: I) -> Self {
        let mut inner = self.inner.clone();
        for v in values {
            inner.insert(v);
        }
        Self { inner }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.inner.contains(value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Set union.
    pub fn union(&self, other: &Self) -> Self {
        // union the smaller set into the larger one
        let (big, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut inner = big.inner.clone();
        for v in small.iter() {
            inner.insert(v.clone());
        }
        Self { inner }
    }

    /// Elements of `self` that are not in `other`.
    pub fn subtract(&self, other: &Self) -> Self {
        let mut inner = self.inner.clone();
        for v in other.iter() {
            inner.remove(v);
        }
        Self { inner }
    }

    /// Elements of `self` that are also in `other`.
    pub fn intersect(&self, other: &Self) -> Self {
        let (big, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        Self {
            inner: small
                .iter()
                .filter(|v| big.contains(v))
                .cloned()
                .collect(),
        }
    }

    /// Removes every element for which `pred` returns true.
    pub fn remove_if<F: FnMut(&T) -> bool>(&self, mut pred: F) -> Self {
        let mut inner = self.inner.clone();
        for v in self.iter() {
            if pred(v) {
                inner.remove(v);
            }
        }
        Self { inner }
    }

    /// Keeps every element for which `pred` returns true.
    pub fn retain_if<F: FnMut(&T) -> bool>(&self, mut pred: F) -> Self {
        self.remove_if(|v| !pred(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }

    /// Whether every element of `self` is in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Snapshot into a mutable standard set.
    pub fn to_mutable(&self) -> FxHashSet<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Hash + Eq + Clone> Clone for PersistentSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Hash + Eq + Clone> Default for PersistentSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for PersistentSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<T: Hash + Eq + Clone> PartialEq for PersistentSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Hash + Eq + Clone> Eq for PersistentSet<T> {}

impl<T: Hash + Eq + Clone> Hash for PersistentSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Commutative combination, so the hash does not depend on trie shape
        // or iteration order.
        let mut acc: u64 = 0;
        for v in self.iter() {
            let mut h = FxHasher::default();
            v.hash(&mut h);
            acc ^= h.finish();
        }
        state.write_u64(acc);
        state.write_usize(self.len());
    }
}

impl<T: Hash + Eq + Clone + fmt::Debug> fmt::Debug for PersistentSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// An immutable, structurally shared map with value semantics.
///
/// When the value type implements [`Join`], the map supports
/// [`weak_update`](Self::weak_update) and per-key [`join`](Self::join), the
/// two operations lattice-valued stores are built from.
pub struct PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    inner: im::HashMap<K, V, FxBuildHasher>,
}

impl<K: Hash + Eq + Clone, V: Clone> PersistentMap<K, V> {
    pub fn empty() -> Self {
        Self {
            inner: im::HashMap::default(),
        }
    }

    /// Returns a new map with `key` bound to `value`, replacing any previous
    /// binding.
    pub fn insert(&self, key: K, value: V) -> Self {
        let mut inner = self.inner.clone();
        inner.insert(key, value);
        Self { inner }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns a new map without `key`.
    pub fn remove(&self, key: &K) -> Self {
        let mut inner = self.inner.clone();
        inner.remove(key);
        Self { inner }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    /// Snapshot into a mutable standard map.
    pub fn to_mutable(&self) -> FxHashMap<K, V> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K: Hash + Eq + Clone, V: Clone + Join> PersistentMap<K, V> {
    /// Inserts `value` at `key` if absent; otherwise replaces the existing
    /// binding with `existing.join(&value)`.
    pub fn weak_update(&self, key: K, value: V) -> Self {
        let joined = match self.get(&key) {
            Some(existing) => existing.join(&value),
            None => value,
        };
        self.insert(key, joined)
    }

    /// Per-key join: the key set is the union of both maps, and keys present
    /// on both sides carry the join of the two values.
    pub fn join(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (k, v) in other.iter() {
            result = result.weak_update(k.clone(), v.clone());
        }
        result
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for PersistentMap<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> FromIterator<(K, V)> for PersistentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> PartialEq for PersistentMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K: Hash + Eq + Clone, V: Clone + Eq> Eq for PersistentMap<K, V> {}

impl<K: Hash + Eq + Clone, V: Clone + Hash> Hash for PersistentMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut acc: u64 = 0;
        for (k, v) in self.iter() {
            let mut h = FxHasher::default();
            k.hash(&mut h);
            v.hash(&mut h);
            acc ^= h.finish();
        }
        state.write_u64(acc);
        state.write_usize(self.len());
    }
}

impl<K, V> fmt::Debug for PersistentMap<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use std::hash::BuildHasher;

    fn hash_of<T: Hash>(v: &T) -> u64 {
        FxBuildHasher::default().hash_one(v)
    }

    fn set(values: &[i32]) -> PersistentSet<i32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_empty_set() {
        let s: PersistentSet<i32> = PersistentSet::empty();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert!(!s.contains(&1));
    }

    #[test]
    fn test_add_is_persistent() {
        let a = set(&[1, 2]);
        let b = a.add(3);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 3);
        assert!(!a.contains(&3));
        assert!(b.contains(&3));
    }

    #[test]
    fn test_remove_is_persistent() {
        let a = set(&[1, 2, 3]);
        let b = a.remove(&2);
        assert!(a.contains(&2));
        assert!(!b.contains(&2));
        assert_eq!(b, set(&[1, 3]));
    }

    #[test]
    fn test_union_subtract_intersect() {
        let a = set(&[1, 2, 3]);
        let b = set(&[3, 4]);
        assert_eq!(a.union(&b), set(&[1, 2, 3, 4]));
        assert_eq!(a.subtract(&b), set(&[1, 2]));
        assert_eq!(a.intersect(&b), set(&[3]));
    }

    #[test]
    fn test_remove_if() {
        let a = set(&[1, 2, 3, 4, 5]);
        assert_eq!(a.remove_if(|v| v % 2 == 0), set(&[1, 3, 5]));
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_value_equality_ignores_construction_order() {
        let a = set(&[1, 2, 3]);
        let b = PersistentSet::unit(3).add(1).add(2);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_subset() {
        assert!(set(&[1, 2]).is_subset_of(&set(&[1, 2, 3])));
        assert!(!set(&[1, 4]).is_subset_of(&set(&[1, 2, 3])));
        assert!(PersistentSet::<i32>::empty().is_subset_of(&set(&[1])));
    }

    #[quickcheck]
    fn prop_union_commutative(a: Vec<i16>, b: Vec<i16>) -> bool {
        let (a, b): (PersistentSet<i16>, PersistentSet<i16>) =
            (a.into_iter().collect(), b.into_iter().collect());
        a.union(&b) == b.union(&a)
    }

    #[quickcheck]
    fn prop_union_idempotent(a: Vec<i16>) -> bool {
        let a: PersistentSet<i16> = a.into_iter().collect();
        a.union(&a) == a
    }

    #[quickcheck]
    fn prop_subtract_then_union_restores_superset(a: Vec<i16>, b: Vec<i16>) -> bool {
        let (a, b): (PersistentSet<i16>, PersistentSet<i16>) =
            (a.into_iter().collect(), b.into_iter().collect());
        a.subtract(&b).union(&b) == a.union(&b)
    }

    #[quickcheck]
    fn prop_intersect_is_subset(a: Vec<i16>, b: Vec<i16>) -> bool {
        let (a, b): (PersistentSet<i16>, PersistentSet<i16>) =
            (a.into_iter().collect(), b.into_iter().collect());
        let i = a.intersect(&b);
        i.is_subset_of(&a) && i.is_subset_of(&b)
    }

    #[quickcheck]
    fn prop_equal_sets_hash_equal(a: Vec<i16>) -> bool {
        let s1: PersistentSet<i16> = a.iter().copied().collect();
        let s2: PersistentSet<i16> = a.iter().rev().copied().collect();
        s1 == s2 && hash_of(&s1) == hash_of(&s2)
    }

    // A tiny lattice value for exercising the map's join operations.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct MaxInt(i64);

    impl Join for MaxInt {
        fn join(&self, other: &Self) -> Self {
            MaxInt(self.0.max(other.0))
        }
    }

    #[test]
    fn test_map_insert_get() {
        let m = PersistentMap::empty().insert("a", MaxInt(1));
        assert_eq!(m.get(&"a"), Some(&MaxInt(1)));
        assert!(m.contains_key(&"a"));
        assert!(!m.contains_key(&"b"));
    }

    #[test]
    fn test_weak_update_joins_existing() {
        let m = PersistentMap::empty().insert("a", MaxInt(3));
        let m2 = m.weak_update("a", MaxInt(1));
        assert_eq!(m2.get(&"a"), Some(&MaxInt(3)));
        let m3 = m.weak_update("a", MaxInt(7));
        assert_eq!(m3.get(&"a"), Some(&MaxInt(7)));
        // fresh keys are plain inserts
        let m4 = m.weak_update("b", MaxInt(2));
        assert_eq!(m4.get(&"b"), Some(&MaxInt(2)));
    }

    #[test]
    fn test_map_join_unions_keys() {
        let a = PersistentMap::empty()
            .insert("x", MaxInt(1))
            .insert("y", MaxInt(5));
        let b = PersistentMap::empty()
            .insert("y", MaxInt(2))
            .insert("z", MaxInt(9));
        let j = a.join(&b);
        assert_eq!(j.len(), 3);
        assert_eq!(j.get(&"x"), Some(&MaxInt(1)));
        assert_eq!(j.get(&"y"), Some(&MaxInt(5)));
        assert_eq!(j.get(&"z"), Some(&MaxInt(9)));
    }

    #[quickcheck]
    fn prop_map_join_commutative_for_max(a: Vec<(u8, i64)>, b: Vec<(u8, i64)>) -> bool {
        let a: PersistentMap<u8, MaxInt> =
            a.into_iter().map(|(k, v)| (k, MaxInt(v))).collect();
        let b: PersistentMap<u8, MaxInt> =
            b.into_iter().map(|(k, v)| (k, MaxInt(v))).collect();
        a.join(&b) == b.join(&a)
    }
}

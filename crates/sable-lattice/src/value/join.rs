//! Join (least upper bound) and widening.
//!
//! Joining is per-facet. Numbers and strings first try to stay concrete;
//! two different concrete constants fall back to their category bits, with
//! strings additionally recording an included-string enumeration and a
//! shared prefix where one exists. Widening sacrifices the string
//! refinements for termination: a growing included-string set and a changing
//! excluded-string set are promoted one step, to absent.

use sable_util::{Join as _, PersistentSet};

use crate::error::{fatal, AnalysisError};
use crate::options::Options;
use crate::partition::FreeVariablePartitioning;
use crate::strings;

use super::{num_category, str_category_flag, Value, ValueData, ValueFlags};

fn join_fvp(
    a: &Option<FreeVariablePartitioning>,
    b: &Option<FreeVariablePartitioning>,
) -> Option<FreeVariablePartitioning> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.join(y)),
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (None, None) => None,
    }
}

fn join_label_sets(
    a: &Option<PersistentSet<crate::label::ObjectLabel>>,
    b: &Option<PersistentSet<crate::label::ObjectLabel>>,
) -> Option<PersistentSet<crate::label::ObjectLabel>> {
    match (a, b) {
        (None, None) => None,
        (Some(s), None) | (None, Some(s)) => Some(s.clone()),
        (Some(x), Some(y)) => Some(x.union(y)),
    }
}

/// The exhaustive string enumeration of a value, when one exists: the
/// included-string set, the single string, or nothing at all. Fuzzy bits and
/// prefixes make a value non-enumerable.
fn enumeration(d: &ValueData) -> Option<PersistentSet<String>> {
    if let Some(included) = &d.included_strings {
        return Some(included.clone());
    }
    if d.flags.intersects(ValueFlags::STR) {
        return None;
    }
    Some(match &d.str {
        Some(s) => PersistentSet::unit(s.clone()),
        None => PersistentSet::empty(),
    })
}

impl Value {
    /// The least upper bound of `self` and `other`.
    pub fn join(&self, other: &Value) -> Value {
        self.join_with(other, false)
    }

    /// Join with widening: included strings collapse on any growth and
    /// excluded strings on any change, guaranteeing termination of
    /// ascending chains through the string refinements.
    pub fn join_widening(&self, other: &Value) -> Value {
        self.join_with(other, true)
    }

    /// Folds a collection with [`join`](Self::join); bottom for an empty
    /// collection.
    pub fn join_many<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
        let mut iter = values.into_iter();
        match iter.next() {
            None => Value::make_none(),
            Some(first) => iter.fold(first.clone(), |acc, v| acc.join(v)),
        }
    }

    fn join_with(&self, other: &Value, widen: bool) -> Value {
        if self == other {
            return self.clone();
        }
        if self.is_unknown() {
            // the known side wins, the receiver's partitioning survives
            if self.0.free_variable_partitioning.is_some()
                && other.0.free_variable_partitioning != self.0.free_variable_partitioning
            {
                let fvp = self.0.free_variable_partitioning.clone();
                return other.with(|d| d.free_variable_partitioning = fvp);
            }
            return other.clone();
        }
        if other.is_unknown() {
            return self.clone();
        }
        match (self.is_polymorphic(), other.is_polymorphic()) {
            (true, true) => {
                if self.0.var != other.0.var {
                    fatal(AnalysisError::PolymorphicMismatch);
                }
                let flags = other.0.flags;
                let fvp = join_fvp(
                    &self.0.free_variable_partitioning,
                    &other.0.free_variable_partitioning,
                );
                self.with(|d| {
                    d.flags |= flags;
                    d.free_variable_partitioning = fvp;
                })
            }
            (true, false) => absorb_property_bits(other, self),
            (false, true) => absorb_property_bits(self, other),
            (false, false) => self.join_single_value(other, widen),
        }
    }

    fn join_single_value(&self, other: &Value, widen: bool) -> Value {
        let a = &*self.0;
        let b = &*other.0;
        let mut d = a.clone();

        d.flags = a.flags | b.flags;
        d.flags.remove(ValueFlags::STR_PREFIX); // re-derived below

        join_numbers(&mut d, a, b);
        join_strings(&mut d, a, b);
        join_included_strings(&mut d, a, b, widen);
        join_excluded_strings(&mut d, self, other, widen);

        d.object_labels = join_label_sets(&a.object_labels, &b.object_labels);
        d.getters = join_label_sets(&a.getters, &b.getters);
        d.setters = join_label_sets(&a.setters, &b.setters);
        d.free_variable_partitioning = join_fvp(
            &a.free_variable_partitioning,
            &b.free_variable_partitioning,
        );

        if d == *self.0 {
            return self.clone();
        }
        if d == *other.0 {
            return other.clone();
        }
        Value::intern(d)
    }
}

/// Non-polymorphic `base` absorbs the property bits of polymorphic `poly`.
fn absorb_property_bits(base: &Value, poly: &Value) -> Value {
    let bits = poly.0.flags
        & (ValueFlags::ABSENT
            | ValueFlags::ATTR
            | ValueFlags::EXTENDEDSCOPE
            | ValueFlags::MODIFIED);
    let fvp = join_fvp(
        &base.0.free_variable_partitioning,
        &poly.0.free_variable_partitioning,
    );
    base.with(|d| {
        d.flags |= bits;
        d.free_variable_partitioning = fvp;
    })
}

fn join_numbers(d: &mut ValueData, a: &ValueData, b: &ValueData) {
    d.num = match (a.num, b.num) {
        (Some(x), Some(y)) => {
            if x.to_bits() == y.to_bits() {
                Some(x)
            } else {
                d.flags |= num_category(x) | num_category(y);
                None
            }
        }
        (Some(x), None) => {
            if b.flags.intersects(ValueFlags::NUM) {
                d.flags |= num_category(x);
                None
            } else {
                Some(x)
            }
        }
        (None, Some(y)) => {
            if a.flags.intersects(ValueFlags::NUM) {
                d.flags |= num_category(y);
                None
            } else {
                Some(y)
            }
        }
        (None, None) => None,
    };
}

/// Joins the single/prefix string parts into `d`, whose flags already hold
/// the union of both sides' category bits (prefix bit cleared).
fn join_strings(d: &mut ValueData, a: &ValueData, b: &ValueData) {
    let a_prefix = a.flags.contains(ValueFlags::STR_PREFIX);
    let b_prefix = b.flags.contains(ValueFlags::STR_PREFIX);
    let fuzzy_b = b.flags.intersects(ValueFlags::STR_CATEGORIES);
    let fuzzy_a = a.flags.intersects(ValueFlags::STR_CATEGORIES);

    d.str = None;
    match (&a.str, &b.str) {
        (None, None) => {}
        (Some(x), None) => {
            join_str_one_sided(d, x, a_prefix, fuzzy_b || b.flags.contains(ValueFlags::STR_PREFIX));
        }
        (None, Some(y)) => {
            join_str_one_sided(d, y, b_prefix, fuzzy_a || a.flags.contains(ValueFlags::STR_PREFIX));
        }
        (Some(x), Some(y)) => match (a_prefix, b_prefix) {
            (false, false) => {
                if x == y {
                    d.str = Some(x.clone());
                } else {
                    let p = strings::shared_prefix(x, y);
                    if p.is_empty() {
                        d.flags |= str_category_flag(x) | str_category_flag(y);
                    } else {
                        d.str = Some(p.to_string());
                        d.flags |= ValueFlags::STR_PREFIX;
                    }
                }
            }
            (true, true) => {
                let p = strings::shared_prefix(x, y);
                if p.is_empty() {
                    d.flags |= ValueFlags::STR_CATEGORIES;
                } else {
                    d.str = Some(p.to_string());
                    d.flags |= ValueFlags::STR_PREFIX;
                }
            }
            // single against prefix: the shared prefix, if any, covers both
            (false, true) | (true, false) => {
                let p = strings::shared_prefix(x, y);
                if p.is_empty() {
                    let single = if a_prefix { y } else { x };
                    d.flags |= str_category_flag(single) | ValueFlags::STR_CATEGORIES;
                } else {
                    d.str = Some(p.to_string());
                    d.flags |= ValueFlags::STR_PREFIX;
                }
            }
        },
    }

    // a prefix cannot coexist with the non-index category bits; widen it out
    if d.flags.contains(ValueFlags::STR_PREFIX)
        && d.flags.intersects(
            ValueFlags::STR_OTHERNUM | ValueFlags::STR_IDENTIFIERPARTS | ValueFlags::STR_OTHER,
        )
    {
        d.flags.remove(ValueFlags::STR_PREFIX);
        d.str = None;
        d.flags |= ValueFlags::STR_CATEGORIES;
    }
}

/// One side holds a single or prefix string, the other holds no concrete
/// string; `other_fuzzy` tells whether that other side has any fuzzy string
/// possibility.
fn join_str_one_sided(d: &mut ValueData, s: &str, is_prefix: bool, other_fuzzy: bool) {
    if !other_fuzzy {
        d.str = Some(s.to_string());
        if is_prefix {
            d.flags |= ValueFlags::STR_PREFIX;
        }
    } else if is_prefix {
        // prefix meets fuzzy strings: the prefix set dissolves into the
        // full category union
        d.flags |= ValueFlags::STR_CATEGORIES;
    } else {
        d.flags |= str_category_flag(s);
    }
}

fn join_included_strings(d: &mut ValueData, a: &ValueData, b: &ValueData, widen: bool) {
    let options = Options::get();
    if options.no_string_sets {
        d.included_strings = None;
        return;
    }
    // a surviving single string needs no enumeration
    if d.str.is_some() && !d.flags.contains(ValueFlags::STR_PREFIX) {
        d.included_strings = None;
        return;
    }
    let joined = match (enumeration(a), enumeration(b)) {
        (Some(ea), Some(eb)) => Some((ea.union(&eb), ea)),
        _ => None,
    };
    d.included_strings = match joined {
        Some((union, own)) if union.len() >= 2 => {
            if union.len() > options.string_sets_bound {
                None
            } else if widen && union != own {
                // widening promotes any growing enumeration straight to absent
                None
            } else {
                Some(union)
            }
        }
        _ => None,
    };
}

fn join_excluded_strings(d: &mut ValueData, a_val: &Value, b_val: &Value, widen: bool) {
    let a = &*a_val.0;
    let b = &*b_val.0;
    if d.included_strings.is_some() || !d.flags.intersects(ValueFlags::STR) {
        d.excluded_strings = None;
        return;
    }
    // a string stays excluded only when the other side cannot produce it
    let mut residual: Option<PersistentSet<String>> = None;
    if let Some(ex) = &a.excluded_strings {
        let kept = ex.retain_if(|s| !b_val.is_maybe_str(s));
        if !kept.is_empty() {
            residual = Some(kept);
        }
    }
    if let Some(ex) = &b.excluded_strings {
        let kept = ex.retain_if(|s| !a_val.is_maybe_str(s));
        if !kept.is_empty() {
            residual = Some(match residual {
                Some(r) => r.union(&kept),
                None => kept,
            });
        }
    }
    if widen
        && a.excluded_strings.is_some()
        && b.excluded_strings.is_some()
        && residual != a.excluded_strings
    {
        residual = None;
    }
    d.excluded_strings = residual;
}

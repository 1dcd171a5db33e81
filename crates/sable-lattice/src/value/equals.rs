//! Equality-driven restriction.
//!
//! These four operators transfer conditionals of the form `if (x OP y)` for
//! the strict and loose equality operators. The true branch intersects the
//! receiver with what it could be while equal to `other`; the false branch
//! removes a value only when `other` pins down a single concrete one.
//!
//! All four may over-approximate (returning something larger than the ideal
//! restriction, bounded by the receiver); they never drop a concrete value
//! that could make the tested condition true. Loose equality follows the
//! coercion rules of the analyzed language: `undefined` and `null` are
//! mutually equal and equal to nothing else, booleans coerce to `0`/`1`,
//! and strings coerce through their numeric value, the empty string to `0`.

use sable_util::PersistentSet;

use crate::label::ObjectLabel;
use crate::strings;

use super::restrict::reduce_included;
use super::{num_category, str_category_flag, Value, ValueData, ValueFlags};

/// A single concrete value another side of a comparison may pin down.
enum Concrete {
    Undef,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Label(ObjectLabel),
}

/// The numbers a value can reach through loose coercion: its own number
/// facet (NaN excluded, it equals nothing), booleans as 0/1, and strings
/// through their numeric value.
struct TouchedNumbers {
    /// Every non-NaN number is reachable (prefix or JSON strings).
    any: bool,
    bits: ValueFlags,
    singles: Vec<f64>,
}

impl TouchedNumbers {
    fn covers(&self, n: f64) -> bool {
        self.any
            || self.bits.intersects(num_category(n))
            || self.singles.iter().any(|m| *m == n)
    }

    fn is_empty(&self) -> bool {
        !self.any && self.bits.is_empty() && self.singles.is_empty()
    }
}

fn touched_numbers(v: &Value) -> TouchedNumbers {
    let d = &*v.0;
    let mut t = TouchedNumbers {
        any: false,
        bits: d.flags & (ValueFlags::NUM & !ValueFlags::NUM_NAN),
        singles: Vec::new(),
    };
    if let Some(n) = d.num {
        t.singles.push(n);
    }
    if d.flags.contains(ValueFlags::BOOL_TRUE) {
        t.singles.push(1.0);
    }
    if d.flags.contains(ValueFlags::BOOL_FALSE) {
        t.singles.push(0.0);
    }
    if let Some(included) = &d.included_strings {
        // exhaustive enumeration: exactly these strings coerce
        for s in included.iter() {
            if let Some(n) = strings::numeric_value(s) {
                t.singles.push(n);
            }
        }
    } else if d.flags.intersects(ValueFlags::STR_JSON | ValueFlags::STR_PREFIX) {
        t.any = true;
    } else {
        if d.flags.contains(ValueFlags::STR_UINT) {
            t.bits |= ValueFlags::NUM_ZERO | ValueFlags::NUM_UINT_POS;
        }
        if d.flags.contains(ValueFlags::STR_OTHERNUM) {
            // other-numeric strings reach every non-NaN number
            t.bits |= ValueFlags::NUM_NOT_NAN_INF | ValueFlags::NUM_INF;
        }
        if let Some(s) = &d.str {
            if let Some(n) = strings::numeric_value(s) {
                t.singles.push(n);
            }
        }
    }
    t
}

impl Value {
    /// The part of this value that may be strictly equal (`===`) to `other`.
    pub fn restrict_to_strict_equals(&self, other: &Value) -> Value {
        self.check_not_polymorphic_or_unknown();
        other.check_not_polymorphic_or_unknown();
        // a getter on the other side may produce anything
        if other.is_maybe_getter() {
            return self.clone();
        }
        let a = &*self.0;
        let b = &*other.0;
        let mut d = a.clone();

        let and = a.flags & b.flags;
        d.flags.remove(ValueFlags::BOOL | ValueFlags::NULL);
        d.flags |= and & (ValueFlags::BOOL | ValueFlags::NULL);

        // absence reads as undefined
        if !b.flags.intersects(ValueFlags::UNDEF | ValueFlags::ABSENT) {
            d.flags.remove(ValueFlags::UNDEF | ValueFlags::ABSENT);
        }

        strict_equals_numbers(&mut d, a, b);
        strict_equals_strings(&mut d, self, other);

        d.object_labels = match (&a.object_labels, &b.object_labels) {
            (Some(x), Some(y)) => {
                let inter = x.intersect(y);
                (!inter.is_empty()).then_some(inter)
            }
            _ => None,
        };
        d.setters = match (&a.setters, &b.setters) {
            (Some(x), Some(y)) => {
                let inter = x.intersect(y);
                (!inter.is_empty()).then_some(inter)
            }
            _ => None,
        };

        if d == *self.0 {
            return self.clone();
        }
        Value::intern(d)
    }

    /// The part of this value that may be strictly unequal (`!==`) to
    /// `other`. Only restricts when `other` is a single concrete value;
    /// NaN is unequal even to itself and removes nothing.
    pub fn restrict_to_strict_not_equals(&self, other: &Value) -> Value {
        self.check_not_polymorphic_or_unknown();
        other.check_not_polymorphic_or_unknown();
        let Some(concrete) = single_concrete(other) else {
            return self.clone();
        };
        match concrete {
            Concrete::Undef => self.with(|d| {
                d.flags.remove(ValueFlags::UNDEF | ValueFlags::ABSENT)
            }),
            Concrete::Null => self.with(|d| d.flags.remove(ValueFlags::NULL)),
            Concrete::Bool(true) => self.with(|d| d.flags.remove(ValueFlags::BOOL_TRUE)),
            Concrete::Bool(false) => self.with(|d| d.flags.remove(ValueFlags::BOOL_FALSE)),
            Concrete::Num(n) => self.with(|d| {
                if d.num.is_some_and(|m| m == n) {
                    d.num = None;
                }
            }),
            Concrete::Str(s) => self.restrict_to_not_strings(&PersistentSet::unit(s)),
            Concrete::Label(label) => self.with(|d| {
                if let Some(labels) = &d.object_labels {
                    let remaining = labels.remove(&label);
                    d.object_labels = (!remaining.is_empty()).then_some(remaining);
                }
            }),
        }
    }

    /// The part of this value that may be loosely equal (`==`) to `other`.
    /// Gives up (returns `self`) when either side may be an object, whose
    /// coercion is beyond the lattice.
    pub fn restrict_to_loose_equals(&self, other: &Value) -> Value {
        self.check_not_polymorphic_or_unknown();
        other.check_not_polymorphic_or_unknown();
        if has_object_component(self) || has_object_component(other) {
            return self.clone();
        }
        let a = &*self.0;
        let b = &*other.0;
        let mut d = a.clone();

        let nullish = b
            .flags
            .intersects(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::ABSENT);
        if !nullish {
            d.flags
                .remove(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::ABSENT);
        }

        let touched = touched_numbers(other);
        if !touched.covers(1.0) {
            d.flags.remove(ValueFlags::BOOL_TRUE);
        }
        if !touched.covers(0.0) {
            d.flags.remove(ValueFlags::BOOL_FALSE);
        }

        loose_equals_numbers(&mut d, a, &touched);
        loose_equals_strings(&mut d, self, other, &touched);

        if d == *self.0 {
            return self.clone();
        }
        Value::intern(d)
    }

    /// The part of this value that may be loosely unequal (`!=`) to
    /// `other`. Restricts on a definitely-nullish other side and on single
    /// concrete primitives, removing the whole coercion class where it is
    /// finite.
    pub fn restrict_to_loose_not_equals(&self, other: &Value) -> Value {
        self.check_not_polymorphic_or_unknown();
        other.check_not_polymorphic_or_unknown();
        if is_definitely_nullish(other) {
            return self.with(|d| {
                d.flags
                    .remove(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::ABSENT)
            });
        }
        let Some(concrete) = single_concrete(other) else {
            return self.clone();
        };
        match concrete {
            // nullish singles were handled above
            Concrete::Undef | Concrete::Null => self.clone(),
            Concrete::Bool(bv) => {
                let v = self.with(|d| {
                    d.flags.remove(if bv {
                        ValueFlags::BOOL_TRUE
                    } else {
                        ValueFlags::BOOL_FALSE
                    })
                });
                v.remove_loose_numeric_class(if bv { 1.0 } else { 0.0 })
            }
            Concrete::Num(n) => self.remove_loose_numeric_class(n),
            Concrete::Str(s) => {
                let v = self.restrict_to_not_strings(&PersistentSet::unit(s.clone()));
                match strings::numeric_value(&s) {
                    Some(n) => v.remove_loose_numeric_class(n),
                    None => v,
                }
            }
            Concrete::Label(label) => self.with(|d| {
                if let Some(labels) = &d.object_labels {
                    let remaining = labels.remove(&label);
                    d.object_labels = (!remaining.is_empty()).then_some(remaining);
                }
            }),
        }
    }

    /// Removes the members of the loose-equality class of the number `n`
    /// that this value pins down exactly: the single number, single strings
    /// and enumerated strings coercing to `n`, and the boolean with that
    /// numeric value. Fuzzy facets are untouched.
    fn remove_loose_numeric_class(&self, n: f64) -> Value {
        self.with(|d| {
            if d.num.is_some_and(|m| m == n) {
                d.num = None;
            }
            if n == 1.0 {
                d.flags.remove(ValueFlags::BOOL_TRUE);
            }
            if n == 0.0 {
                d.flags.remove(ValueFlags::BOOL_FALSE);
            }
            let single_coerces = !d.flags.contains(ValueFlags::STR_PREFIX)
                && d.str
                    .as_ref()
                    .is_some_and(|s| strings::numeric_value(s) == Some(n));
            if single_coerces {
                d.str = None;
            }
            if let Some(included) = d.included_strings.clone() {
                let remaining =
                    included.remove_if(|s| strings::numeric_value(s) == Some(n));
                reduce_included(d, remaining);
            }
        })
    }
}

fn has_object_component(v: &Value) -> bool {
    v.0.object_labels.is_some() || v.0.getters.is_some() || v.0.setters.is_some()
}

fn is_definitely_nullish(v: &Value) -> bool {
    let d = &*v.0;
    d.flags
        .intersects(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::ABSENT)
        && !d.flags.intersects(ValueFlags::BOOL | ValueFlags::NUM | ValueFlags::STR)
        && d.num.is_none()
        && d.str.is_none()
        && d.object_labels.is_none()
        && d.getters.is_none()
        && d.setters.is_none()
}

/// Identifies `v` as exactly one concrete value, ignoring attribute bits.
fn single_concrete(v: &Value) -> Option<Concrete> {
    let d = &*v.0;
    if d.getters.is_some() || d.setters.is_some() {
        return None;
    }
    let facets = d.flags & (ValueFlags::PRIMITIVE | ValueFlags::ABSENT);
    let fields = [
        d.num.is_some(),
        d.str.is_some(),
        d.object_labels.is_some(),
    ];
    let field_count = fields.iter().filter(|b| **b).count();

    if field_count == 0 {
        return match facets {
            f if f == ValueFlags::UNDEF => Some(Concrete::Undef),
            f if f == ValueFlags::NULL => Some(Concrete::Null),
            f if f == ValueFlags::BOOL_TRUE => Some(Concrete::Bool(true)),
            f if f == ValueFlags::BOOL_FALSE => Some(Concrete::Bool(false)),
            _ => None,
        };
    }
    if !facets.is_empty() || field_count > 1 {
        return None;
    }
    if let Some(n) = d.num {
        return Some(Concrete::Num(n));
    }
    if let Some(s) = &d.str {
        return Some(Concrete::Str(s.clone()));
    }
    if let Some(labels) = &d.object_labels {
        if labels.len() == 1 {
            let label = labels.iter().next().cloned()?;
            if label.is_singleton() {
                return Some(Concrete::Label(label));
            }
        }
    }
    None
}

fn strict_equals_numbers(d: &mut ValueData, a: &ValueData, b: &ValueData) {
    match (a.num, b.num) {
        (Some(x), Some(y)) => {
            if x != y {
                d.num = None;
            }
        }
        (Some(x), None) => {
            if !b.flags.intersects(num_category(x)) {
                d.num = None;
            }
        }
        (None, Some(y)) => {
            d.flags.remove(ValueFlags::NUM);
            if a.flags.intersects(num_category(y)) {
                d.num = Some(y);
            }
        }
        (None, None) => {
            let and = a.flags & b.flags & ValueFlags::NUM;
            d.flags.remove(ValueFlags::NUM);
            d.flags |= and;
        }
    }
}

fn clear_string_facet(d: &mut ValueData) {
    d.flags.remove(ValueFlags::STR);
    d.str = None;
    d.excluded_strings = None;
    d.included_strings = None;
}

fn strict_equals_strings(d: &mut ValueData, self_v: &Value, other: &Value) {
    let a = &*self_v.0;
    let b = &*other.0;
    let a_prefix = a.flags.contains(ValueFlags::STR_PREFIX);
    let b_prefix = b.flags.contains(ValueFlags::STR_PREFIX);

    // the receiver is a single string: it survives or it does not
    if a.str.is_some() && !a_prefix {
        if !a
            .str
            .as_ref()
            .is_some_and(|s| other.is_maybe_str(s))
        {
            d.str = None;
        }
        return;
    }
    // the other side is a single string: collapse to it if possible
    if b.str.is_some() && !b_prefix {
        let s = b.str.clone().unwrap_or_default();
        let possible = self_v.is_maybe_str(&s);
        clear_string_facet(d);
        if possible {
            d.str = Some(s);
        }
        return;
    }
    // the other side has no string facet at all
    if !b.flags.intersects(ValueFlags::STR) {
        clear_string_facet(d);
        return;
    }
    // JSON on either side widens to "any string": nothing to refine
    if a.flags.contains(ValueFlags::STR_JSON) || b.flags.contains(ValueFlags::STR_JSON) {
        return;
    }

    match (a_prefix, b_prefix) {
        (true, true) => {
            let pa = a.str.as_deref().unwrap_or_default();
            let pb = b.str.as_deref().unwrap_or_default();
            if pa.starts_with(pb) {
                // keep the longer (the receiver's own prefix)
            } else if pb.starts_with(pa) {
                d.str = Some(pb.to_string());
            } else {
                d.flags.remove(ValueFlags::STR_PREFIX);
                d.str = None;
                let and = a.flags & b.flags & ValueFlags::STR_CATEGORIES;
                d.flags.remove(ValueFlags::STR_CATEGORIES);
                d.flags |= and;
            }
        }
        // the receiver's prefix stands; the fuzzy other side cannot
        // sharpen it further
        (true, false) => {}
        // a prefix on the other side may reach into any category of the
        // receiver; keep the receiver's bits
        (false, true) => {}
        (false, false) => {
            let and = a.flags & b.flags & ValueFlags::STR_CATEGORIES;
            d.flags.remove(ValueFlags::STR_CATEGORIES);
            d.flags |= and;
        }
    }

    // intersect the enumerations
    let reduced = match (&a.included_strings, &b.included_strings) {
        (Some(ia), Some(ib)) => Some(ia.intersect(ib)),
        (Some(ia), None) => Some(ia.retain_if(|s| other.is_maybe_str(s))),
        (None, Some(ib)) => Some(ib.retain_if(|s| self_v.is_maybe_str(s))),
        (None, None) => None,
    };
    if let Some(remaining) = reduced {
        reduce_included(d, remaining);
    }

    // pool the exclusions, keeping only those still reachable
    if d.included_strings.is_none() && d.flags.intersects(ValueFlags::STR) {
        let mut excluded = a.excluded_strings.clone();
        if let Some(ex_b) = &b.excluded_strings {
            excluded = Some(match excluded {
                Some(ex) => ex.union(ex_b),
                None => ex_b.clone(),
            });
        }
        d.excluded_strings = excluded
            .map(|ex| {
                ex.retain_if(|s| {
                    d.flags.intersects(str_category_flag(s))
                        || (d.flags.contains(ValueFlags::STR_PREFIX)
                            && d.str.as_ref().is_some_and(|p| s.starts_with(p.as_str())))
                })
            })
            .filter(|ex| !ex.is_empty());
    } else {
        d.excluded_strings = None;
    }
}

fn loose_equals_numbers(d: &mut ValueData, a: &ValueData, touched: &TouchedNumbers) {
    // nothing loosely equals NaN
    d.flags.remove(ValueFlags::NUM_NAN);
    if let Some(n) = a.num {
        if !touched.covers(n) {
            d.num = None;
        }
        return;
    }
    if touched.any {
        return;
    }
    let mut coverage = touched.bits;
    for n in &touched.singles {
        coverage |= num_category(*n);
    }
    let and = d.flags & ValueFlags::NUM & coverage;
    d.flags.remove(ValueFlags::NUM);
    d.flags |= and;
}

fn loose_equals_strings(
    d: &mut ValueData,
    self_v: &Value,
    other: &Value,
    touched: &TouchedNumbers,
) {
    let a = &*self_v.0;
    let b = &*other.0;
    let a_prefix = a.flags.contains(ValueFlags::STR_PREFIX);

    let string_matches = |s: &str| {
        other.is_maybe_str(s)
            || strings::numeric_value(s).is_some_and(|n| touched.covers(n))
    };

    // single string: keep only if something on the other side matches it
    if a.str.is_some() && !a_prefix {
        if !a.str.as_ref().is_some_and(|s| string_matches(s)) {
            d.str = None;
        }
        return;
    }
    // a prefix is kept as is; refining it is beyond the representation
    if a_prefix {
        return;
    }
    if let Some(included) = &a.included_strings {
        let remaining = included.retain_if(|s| string_matches(s));
        reduce_included(d, remaining);
        return;
    }

    let b_may_have_strings = b.flags.intersects(ValueFlags::STR) || b.str.is_some();
    let numbers_reachable = !touched.is_empty();
    // numeric string categories match through coercion as well
    if !(b_may_have_strings || numbers_reachable) {
        d.flags
            .remove(ValueFlags::STR_UINT | ValueFlags::STR_OTHERNUM);
    }
    // non-numeric categories only ever match strictly
    let b_wide = b
        .flags
        .intersects(ValueFlags::STR_PREFIX | ValueFlags::STR_JSON);
    for (flag, category) in [
        (ValueFlags::STR_IDENTIFIER, strings::StringCategory::Identifier),
        (
            ValueFlags::STR_OTHERIDENTIFIERPARTS,
            strings::StringCategory::OtherIdentifierParts,
        ),
        (ValueFlags::STR_OTHER, strings::StringCategory::Other),
    ] {
        let matchable = b_wide
            || b.flags.intersects(flag)
            || b.str
                .as_ref()
                .is_some_and(|s| strings::categorize(s) == category);
        if !matchable {
            d.flags.remove(flag);
        }
    }
    if !d.flags.intersects(ValueFlags::STR) {
        clear_string_facet(d);
    } else if let Some(ex) = d.excluded_strings.take() {
        let kept = ex.retain_if(|s| d.flags.intersects(str_category_flag(s)));
        d.excluded_strings = (!kept.is_empty()).then_some(kept);
    }
}

//! Restriction operators.
//!
//! Each operator returns a value below or equal to the receiver in the
//! lattice order: conditionals and type tests narrow a value by keeping
//! some facets and discarding the rest. Operators that keep a single facet
//! build a fresh value holding only that facet; operators that remove one
//! keep everything else, attributes and partitioning included, so that the
//! kept and removed parts join back to the original.

use sable_util::PersistentSet;

use crate::label::LabelKind;
use crate::options::Options;
use crate::strings;

use super::{str_category_flag, Value, ValueData, ValueFlags};

impl Value {
    /// Builds a value from scratch out of parts of `self`.
    fn fresh(&self, build: impl FnOnce(&ValueData, &mut ValueData)) -> Value {
        let mut d = ValueData::bottom();
        build(&self.0, &mut d);
        if d == *self.0 {
            return self.clone();
        }
        Value::intern(d)
    }

    /// Removes the possibility of absence.
    pub fn restrict_to_not_absent(&self) -> Value {
        self.check_not_unknown();
        self.with(|d| d.flags.remove(ValueFlags::ABSENT))
    }

    /// Keeps only the possibility of absence.
    pub fn restrict_to_absent(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| d.flags = src.flags & ValueFlags::ABSENT)
    }

    pub fn restrict_to_not_null_not_undef(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| d.flags.remove(ValueFlags::NULL | ValueFlags::UNDEF))
    }

    pub fn restrict_to_undef(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| d.flags = src.flags & ValueFlags::UNDEF)
    }

    pub fn restrict_to_not_undef(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| d.flags.remove(ValueFlags::UNDEF))
    }

    pub fn restrict_to_null(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| d.flags = src.flags & ValueFlags::NULL)
    }

    pub fn restrict_to_not_null(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| d.flags.remove(ValueFlags::NULL))
    }

    pub fn restrict_to_bool(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| d.flags = src.flags & ValueFlags::BOOL)
    }

    pub fn restrict_to_not_bool(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| d.flags.remove(ValueFlags::BOOL))
    }

    pub fn restrict_to_num(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| {
            d.flags = src.flags & ValueFlags::NUM;
            d.num = src.num;
        })
    }

    pub fn restrict_to_not_num(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            d.flags.remove(ValueFlags::NUM);
            d.num = None;
        })
    }

    pub fn restrict_to_not_nan(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| d.flags.remove(ValueFlags::NUM_NAN))
    }

    pub fn restrict_to_str(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| {
            d.flags = src.flags & ValueFlags::STR;
            d.str = src.str.clone();
            d.excluded_strings = src.excluded_strings.clone();
            d.included_strings = src.included_strings.clone();
        })
    }

    pub fn restrict_to_not_str(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            d.flags.remove(ValueFlags::STR);
            d.str = None;
            d.excluded_strings = None;
            d.included_strings = None;
        })
    }

    /// Keeps only numeric strings.
    pub fn restrict_to_str_numeric(&self) -> Value {
        self.restrict_to_str_matching(
            ValueFlags::STR_UINT | ValueFlags::STR_OTHERNUM,
            strings::is_numeric,
        )
    }

    /// Keeps only non-numeric strings.
    pub fn restrict_to_str_not_numeric(&self) -> Value {
        self.restrict_to_str_matching(
            ValueFlags::STR_IDENTIFIER
                | ValueFlags::STR_OTHERIDENTIFIERPARTS
                | ValueFlags::STR_OTHER,
            |s| !strings::is_numeric(s),
        )
    }

    /// Fresh string-only value keeping category bits in `keep_flags` and
    /// concrete strings satisfying `keep`. Prefix and JSON parts survive
    /// unrefined.
    fn restrict_to_str_matching(
        &self,
        keep_flags: ValueFlags,
        keep: impl Fn(&str) -> bool,
    ) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| {
            d.flags = src.flags
                & (keep_flags | ValueFlags::STR_PREFIX | ValueFlags::STR_JSON);
            if let Some(s) = &src.str {
                if src.flags.contains(ValueFlags::STR_PREFIX) || keep(s) {
                    d.str = Some(s.clone());
                } else {
                    d.flags.remove(ValueFlags::STR_PREFIX);
                }
            }
            if let Some(included) = &src.included_strings {
                reduce_included(d, included.retain_if(|s| keep(s)));
            } else if let Some(excluded) = &src.excluded_strings {
                if d.flags.intersects(ValueFlags::STR) {
                    let kept = excluded.retain_if(|s| keep(s));
                    d.excluded_strings = (!kept.is_empty()).then_some(kept);
                }
            }
        })
    }

    /// Removes the array-index string category.
    pub fn restrict_to_not_str_uint(&self) -> Value {
        self.remove_str_category(ValueFlags::STR_UINT, strings::is_array_index)
    }

    /// Removes the other-numeric string category.
    pub fn restrict_to_not_str_other_num(&self) -> Value {
        self.remove_str_category(ValueFlags::STR_OTHERNUM, |s| {
            strings::is_numeric(s) && !strings::is_array_index(s)
        })
    }

    /// Removes both identifier-parts string categories.
    pub fn restrict_to_not_str_identifier_parts(&self) -> Value {
        self.remove_str_category(ValueFlags::STR_IDENTIFIERPARTS, |s| {
            strings::is_identifier(s) || strings::is_other_identifier_parts(s)
        })
    }

    /// Dissolves a prefix string into nothing, keeping the category bits.
    pub fn restrict_to_not_str_prefix(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            if d.flags.contains(ValueFlags::STR_PREFIX) {
                d.flags.remove(ValueFlags::STR_PREFIX);
                d.str = None;
            }
        })
    }

    fn remove_str_category(
        &self,
        flag: ValueFlags,
        in_category: impl Fn(&str) -> bool,
    ) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            d.flags.remove(flag);
            let single_in_category = !d.flags.contains(ValueFlags::STR_PREFIX)
                && d.str.as_ref().is_some_and(|s| in_category(s));
            if single_in_category {
                d.str = None;
            }
            if let Some(included) = d.included_strings.clone() {
                reduce_included(d, included.remove_if(|s| in_category(s)));
            }
        })
    }

    /// Removes the given concrete strings.
    ///
    /// A single string drops outright, an enumeration shrinks, and a fuzzy
    /// string records exclusions. A silent no-op when string sets are
    /// disabled.
    pub fn restrict_to_not_strings(&self, strs: &PersistentSet<String>) -> Value {
        self.check_not_polymorphic_or_unknown();
        if Options::get().no_string_sets {
            return self.clone();
        }
        let relevant = strs.retain_if(|s| self.is_maybe_str(s));
        if relevant.is_empty() {
            return self.clone();
        }
        self.with(|d| {
            if d.str.is_some() && !d.flags.contains(ValueFlags::STR_PREFIX) {
                if d.str.as_ref().is_some_and(|s| relevant.contains(s)) {
                    d.str = None;
                }
            } else if let Some(included) = d.included_strings.clone() {
                reduce_included(d, included.subtract(&relevant));
            } else if d.flags.intersects(ValueFlags::STR) {
                d.excluded_strings = Some(match d.excluded_strings.take() {
                    Some(ex) => ex.union(&relevant),
                    None => relevant.clone(),
                });
            }
        })
    }

    /// Keeps only values that coerce to true. Absence counts as false.
    pub fn restrict_to_truthy(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        let without_empty = self.restrict_to_not_strings(&PersistentSet::unit(String::new()));
        without_empty.with(|d| {
            d.flags.remove(
                ValueFlags::UNDEF
                    | ValueFlags::NULL
                    | ValueFlags::BOOL_FALSE
                    | ValueFlags::NUM_ZERO
                    | ValueFlags::NUM_NAN
                    | ValueFlags::ABSENT,
            );
            if d.num.is_some_and(|n| n == 0.0) {
                d.num = None;
            }
            // the empty string survives restrict_to_not_strings when string
            // sets are disabled; a concrete empty string never does
            if d.str.as_deref() == Some("") && !d.flags.contains(ValueFlags::STR_PREFIX) {
                d.str = None;
            }
        })
    }

    /// Keeps only values that coerce to false. Absence counts as false.
    pub fn restrict_to_falsy(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| {
            d.flags = src.flags
                & (ValueFlags::UNDEF
                    | ValueFlags::NULL
                    | ValueFlags::BOOL_FALSE
                    | ValueFlags::NUM_ZERO
                    | ValueFlags::NUM_NAN
                    | ValueFlags::ABSENT
                    | ValueFlags::ATTR);
            if src.num.is_some_and(|n| n == 0.0) {
                d.num = src.num;
            }
            if self.is_maybe_str("") {
                d.str = Some(String::new());
            }
            d.getters = src.getters.clone();
            d.setters = src.setters.clone();
        })
    }

    /// Keeps only the getter component.
    pub fn restrict_to_getter(&self) -> Value {
        self.check_not_unknown();
        self.fresh(|src, d| d.getters = src.getters.clone())
    }

    /// Keeps only the setter component.
    pub fn restrict_to_setter(&self) -> Value {
        self.check_not_unknown();
        self.fresh(|src, d| d.setters = src.setters.clone())
    }

    /// Keeps only the accessor components.
    pub fn restrict_to_getter_setter(&self) -> Value {
        self.check_not_unknown();
        self.fresh(|src, d| {
            d.getters = src.getters.clone();
            d.setters = src.setters.clone();
        })
    }

    /// Removes the accessor components, preserving the remaining facets.
    pub fn restrict_to_not_getter_setter(&self) -> Value {
        self.check_not_unknown();
        self.with(|d| {
            d.getters = None;
            d.setters = None;
        })
    }

    /// Keeps only non-symbol objects.
    pub fn restrict_to_non_symbol_object(&self) -> Value {
        self.filter_labels_fresh(|kind| kind != LabelKind::Symbol)
    }

    /// Keeps only symbols.
    pub fn restrict_to_symbol(&self) -> Value {
        self.filter_labels_fresh(|kind| kind == LabelKind::Symbol)
    }

    /// Removes all symbols, preserving the remaining facets.
    pub fn restrict_to_not_symbol(&self) -> Value {
        self.filter_labels_keeping_rest(|kind| kind != LabelKind::Symbol)
    }

    /// Keeps only functions.
    pub fn restrict_to_function(&self) -> Value {
        self.filter_labels_fresh(|kind| kind == LabelKind::Function)
    }

    /// Removes all functions, preserving the remaining facets.
    pub fn restrict_to_not_function(&self) -> Value {
        self.filter_labels_keeping_rest(|kind| kind != LabelKind::Function)
    }

    /// Keeps only the objects a `typeof` test reports as plain objects:
    /// everything except functions and symbols.
    pub fn restrict_to_typeof_object(&self) -> Value {
        self.filter_labels_fresh(|kind| {
            kind != LabelKind::Function && kind != LabelKind::Symbol
        })
    }

    /// Removes the objects a `typeof` test reports as plain objects,
    /// preserving the remaining facets.
    pub fn restrict_to_not_typeof_object(&self) -> Value {
        self.filter_labels_keeping_rest(|kind| {
            kind == LabelKind::Function || kind == LabelKind::Symbol
        })
    }

    fn filter_labels_fresh(&self, keep: impl Fn(LabelKind) -> bool) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.fresh(|src, d| {
            if let Some(labels) = &src.object_labels {
                let kept = labels.retain_if(|l| keep(l.kind()));
                d.object_labels = (!kept.is_empty()).then_some(kept);
            }
        })
    }

    fn filter_labels_keeping_rest(&self, keep: impl Fn(LabelKind) -> bool) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            if let Some(labels) = &d.object_labels {
                let kept = labels.retain_if(|l| keep(l.kind()));
                d.object_labels = (!kept.is_empty()).then_some(kept);
            }
        })
    }
}

/// Installs a reduced included-strings enumeration into `d`, collapsing to
/// a single string or to no string facet when it shrinks below two.
pub(super) fn reduce_included(d: &mut ValueData, remaining: PersistentSet<String>) {
    match remaining.len() {
        0 => {
            d.included_strings = None;
            d.flags.remove(ValueFlags::STR);
            d.str = None;
        }
        1 => {
            d.included_strings = None;
            d.flags.remove(ValueFlags::STR);
            d.str = remaining.iter().next().cloned();
        }
        _ => d.included_strings = Some(remaining),
    }
}

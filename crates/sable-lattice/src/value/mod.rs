//! The abstract value datatype.
//!
//! A [`Value`] approximates the set of concrete runtime values an expression
//! may evaluate to. It carries seven mostly-orthogonal facets (undefined,
//! null, boolean, number, string, object/symbol reference, accessor) plus
//! property attributes and meta-state (absent, unknown, polymorphic). Each
//! facet is a small sub-lattice of its own: numbers and strings are either a
//! single concrete constant or a union of category bits, strings further
//! refined by included/excluded string sets and a shared-prefix form.
//!
//! Values are immutable and interned: every constructor canonicalizes its
//! result, so equal values are the same allocation and equality and hashing
//! are reference-fast. Construction follows one pattern throughout:
//! copy-with-change, representation checks (debug only), canonicalize.
//!
//! # Representation invariants
//!
//! The facets are coupled; [`check_invariants`] spells out the joint rules
//! (single-string vs. fuzzy-string exclusivity, single-number vs. category
//! bits, non-empty sets, unknown and polymorphic exclusions). They are
//! enforced on every canonicalization when `debug_or_test_enabled` is set.

mod display;
mod equals;
mod join;
mod restrict;


use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHasher;
use sable_util::PersistentSet;

use crate::canonical;
use crate::error::{fatal, AnalysisError};
use crate::label::{LabelKind, ObjectLabel, ObjectProperty, Summarized};
use crate::options::Options;
use crate::partition::FreeVariablePartitioning;
use crate::strings::{self, StringCategory};

bitflags! {
    /// Facet membership, attributes and meta-state of a value.
    ///
    /// The concrete bit layout is private to this crate; only the grouping
    /// is contractual.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct ValueFlags: u32 {
        const BOOL_TRUE = 1 << 0;
        const BOOL_FALSE = 1 << 1;
        const UNDEF = 1 << 2;
        const NULL = 1 << 3;

        /// Strings that are canonical decimal u32 representations.
        const STR_UINT = 1 << 4;
        /// Other numeric strings.
        const STR_OTHERNUM = 1 << 5;
        /// All strings extending the concrete prefix in `str`.
        const STR_PREFIX = 1 << 6;
        /// Identifier strings.
        const STR_IDENTIFIER = 1 << 7;
        /// Identifier-part strings that are not identifiers or indices.
        const STR_OTHERIDENTIFIERPARTS = 1 << 8;
        /// Strings outside all other categories.
        const STR_OTHER = 1 << 9;
        /// Overlay: strings originating from JSON parsing.
        const STR_JSON = 1 << 10;

        const NUM_NAN = 1 << 11;
        /// Both infinities.
        const NUM_INF = 1 << 12;
        /// Both zeros.
        const NUM_ZERO = 1 << 13;
        /// Non-zero numbers with canonical u32 representations.
        const NUM_UINT_POS = 1 << 14;
        /// Finite, non-zero, non-u32 numbers.
        const NUM_OTHER = 1 << 15;

        const ATTR_DONTENUM = 1 << 16;
        const ATTR_NOTDONTENUM = 1 << 17;
        const ATTR_READONLY = 1 << 18;
        const ATTR_NOTREADONLY = 1 << 19;
        const ATTR_DONTDELETE = 1 << 20;
        const ATTR_NOTDONTDELETE = 1 << 21;

        /// The property may be missing entirely.
        const ABSENT = 1 << 22;
        /// Polymorphic only: the property may be present as data.
        const PRESENT_DATA = 1 << 23;
        /// Polymorphic only: the property may be present as an accessor.
        const PRESENT_ACCESSOR = 1 << 24;
        /// The value flows through an extended scope chain.
        const EXTENDEDSCOPE = 1 << 25;
        /// The value is lazily unresolved.
        const UNKNOWN = 1 << 26;
        /// Retained for representation compatibility; no operations set it.
        const MODIFIED = 1 << 27;

        // Composite masks.
        const BOOL = Self::BOOL_TRUE.bits() | Self::BOOL_FALSE.bits();
        /// The five partitioning string categories.
        const STR_CATEGORIES = Self::STR_UINT.bits()
            | Self::STR_OTHERNUM.bits()
            | Self::STR_IDENTIFIER.bits()
            | Self::STR_OTHERIDENTIFIERPARTS.bits()
            | Self::STR_OTHER.bits();
        const STR_IDENTIFIERPARTS =
            Self::STR_IDENTIFIER.bits() | Self::STR_OTHERIDENTIFIERPARTS.bits();
        const STR = Self::STR_CATEGORIES.bits()
            | Self::STR_PREFIX.bits()
            | Self::STR_JSON.bits();
        const NUM = Self::NUM_NAN.bits()
            | Self::NUM_INF.bits()
            | Self::NUM_ZERO.bits()
            | Self::NUM_UINT_POS.bits()
            | Self::NUM_OTHER.bits();
        const NUM_UINT = Self::NUM_ZERO.bits() | Self::NUM_UINT_POS.bits();
        const NUM_NOT_NAN_INF = Self::NUM_ZERO.bits()
            | Self::NUM_UINT_POS.bits()
            | Self::NUM_OTHER.bits();
        const ATTR_DONTENUM_ANY =
            Self::ATTR_DONTENUM.bits() | Self::ATTR_NOTDONTENUM.bits();
        const ATTR_READONLY_ANY =
            Self::ATTR_READONLY.bits() | Self::ATTR_NOTREADONLY.bits();
        const ATTR_DONTDELETE_ANY =
            Self::ATTR_DONTDELETE.bits() | Self::ATTR_NOTDONTDELETE.bits();
        const ATTR = Self::ATTR_DONTENUM_ANY.bits()
            | Self::ATTR_READONLY_ANY.bits()
            | Self::ATTR_DONTDELETE_ANY.bits();
        const PRIMITIVE = Self::UNDEF.bits()
            | Self::NULL.bits()
            | Self::BOOL.bits()
            | Self::NUM.bits()
            | Self::STR.bits();
        const PROPERTYDATA = Self::ATTR.bits()
            | Self::ABSENT.bits()
            | Self::PRESENT_DATA.bits()
            | Self::PRESENT_ACCESSOR.bits()
            | Self::EXTENDEDSCOPE.bits()
            | Self::MODIFIED.bits();
        const META = Self::ABSENT.bits()
            | Self::PRESENT_DATA.bits()
            | Self::PRESENT_ACCESSOR.bits()
            | Self::EXTENDEDSCOPE.bits()
            | Self::UNKNOWN.bits()
            | Self::MODIFIED.bits();
    }
}

/// The payload of a value. Never exposed; `Value` hands out only immutable
/// views of a canonicalized instance.
#[derive(Debug, Clone)]
pub(crate) struct ValueData {
    pub(crate) flags: ValueFlags,
    /// The single concrete number, exclusive with the `NUM_*` bits.
    pub(crate) num: Option<f64>,
    /// A single concrete string, or the prefix when `STR_PREFIX` is set.
    pub(crate) str: Option<String>,
    /// Possible objects and symbols; non-empty when present.
    pub(crate) object_labels: Option<PersistentSet<ObjectLabel>>,
    /// Getter functions of an accessor property; non-empty when present.
    pub(crate) getters: Option<PersistentSet<ObjectLabel>>,
    /// Setter functions of an accessor property; non-empty when present.
    pub(crate) setters: Option<PersistentSet<ObjectLabel>>,
    /// Strings excluded from the fuzzy string facet; non-empty when present.
    pub(crate) excluded_strings: Option<PersistentSet<String>>,
    /// Exhaustive enumeration of the possible strings; size >= 2.
    pub(crate) included_strings: Option<PersistentSet<String>>,
    /// Opaque refinement token, carried through joins.
    pub(crate) free_variable_partitioning: Option<FreeVariablePartitioning>,
    /// When present, this value is polymorphic: a placeholder for the given
    /// property, carrying only absent/present/attribute bits.
    pub(crate) var: Option<ObjectProperty>,
    /// Structural hash, computed once before interning.
    pub(crate) hash: u64,
}

impl ValueData {
    pub(crate) fn bottom() -> Self {
        Self {
            flags: ValueFlags::empty(),
            num: None,
            str: None,
            object_labels: None,
            getters: None,
            setters: None,
            excluded_strings: None,
            included_strings: None,
            free_variable_partitioning: None,
            var: None,
            hash: 0,
        }
    }

    pub(crate) fn with_flags(flags: ValueFlags) -> Self {
        Self {
            flags,
            ..Self::bottom()
        }
    }

    pub(crate) fn compute_hash(&self) -> u64 {
        let mut h = FxHasher::default();
        self.flags.bits().hash(&mut h);
        self.num.map(f64::to_bits).hash(&mut h);
        self.str.hash(&mut h);
        self.object_labels.hash(&mut h);
        self.getters.hash(&mut h);
        self.setters.hash(&mut h);
        self.excluded_strings.hash(&mut h);
        self.included_strings.hash(&mut h);
        self.free_variable_partitioning.hash(&mut h);
        self.var.hash(&mut h);
        h.finish()
    }
}

// Structural equality; the cached hash is derived state and excluded.
// Numbers compare by bit pattern, so -0.0 and 0.0 are distinct
// representatives and NaN (excluded by invariant anyway) would be reflexive.
impl PartialEq for ValueData {
    fn eq(&self, other: &Self) -> bool {
        self.flags == other.flags
            && self.num.map(f64::to_bits) == other.num.map(f64::to_bits)
            && self.str == other.str
            && self.object_labels == other.object_labels
            && self.getters == other.getters
            && self.setters == other.setters
            && self.excluded_strings == other.excluded_strings
            && self.included_strings == other.included_strings
            && self.free_variable_partitioning == other.free_variable_partitioning
            && self.var == other.var
    }
}

impl Eq for ValueData {}

impl Hash for ValueData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// An abstract value: an interned, immutable lattice element.
///
/// Equality and hashing are reference-fast: the canonicalization pool
/// guarantees that structurally equal values share one allocation.
#[derive(Clone)]
pub struct Value(pub(crate) Arc<ValueData>);

static_assertions::assert_impl_all!(Value: Send, Sync);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl sable_util::Join for Value {
    fn join(&self, other: &Self) -> Self {
        Value::join(self, other)
    }
}

/// Checks the joint representation invariants of `data`.
///
/// Called by the canonicalizer when `debug_or_test_enabled` is on; a broken
/// invariant is a fatal internal error.
pub(crate) fn check_invariants(data: &ValueData) {
    fn broken(detail: &str) -> ! {
        fatal(AnalysisError::InvariantBroken(detail.to_string()))
    }

    let f = data.flags;
    if f.intersects(
        ValueFlags::STR_OTHERNUM | ValueFlags::STR_IDENTIFIERPARTS | ValueFlags::STR_OTHER,
    ) && data.str.is_some()
    {
        broken("fuzzy string bits with a concrete string");
    }
    if f.contains(ValueFlags::STR_PREFIX)
        && data.str.as_ref().map_or(true, |s| s.is_empty())
    {
        broken("prefix flag without a non-empty prefix");
    }
    if f.intersects(ValueFlags::NUM) && data.num.is_some() {
        broken("fuzzy number bits with a concrete number");
    }
    if data.num.is_some_and(f64::is_nan) {
        broken("NaN stored as a concrete number");
    }
    for (name, set) in [
        ("object label", &data.object_labels),
        ("getter", &data.getters),
        ("setter", &data.setters),
    ] {
        if set.as_ref().is_some_and(PersistentSet::is_empty) {
            broken(&format!("empty {name} set"));
        }
    }
    if data
        .excluded_strings
        .as_ref()
        .is_some_and(PersistentSet::is_empty)
    {
        broken("empty excluded-strings set");
    }
    if data.included_strings.as_ref().is_some_and(|s| s.len() < 2) {
        broken("included-strings set with fewer than two elements");
    }
    if data.excluded_strings.is_some() && data.included_strings.is_some() {
        broken("both excluded and included strings present");
    }
    if f.contains(ValueFlags::UNKNOWN)
        && (f != ValueFlags::UNKNOWN
            || data.num.is_some()
            || data.str.is_some()
            || data.object_labels.is_some()
            || data.getters.is_some()
            || data.setters.is_some()
            || data.excluded_strings.is_some()
            || data.included_strings.is_some())
    {
        broken("unknown value carrying other state");
    }
    if data.var.is_some()
        && (f.intersects(ValueFlags::PRIMITIVE)
            || data.num.is_some()
            || data.str.is_some()
            || data.object_labels.is_some()
            || data.getters.is_some()
            || data.setters.is_some()
            || data.excluded_strings.is_some()
            || data.included_strings.is_some())
    {
        broken("polymorphic value carrying concrete facets");
    }
    if data.var.is_none()
        && f.intersects(ValueFlags::PRESENT_DATA | ValueFlags::PRESENT_ACCESSOR)
    {
        broken("present bits on a non-polymorphic value");
    }
    if (data.excluded_strings.is_some() || data.included_strings.is_some())
        && !f.intersects(ValueFlags::STR)
    {
        broken("string refinement without fuzzy string bits");
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl Value {
    /// Canonicalizes `data` through the process-wide pool.
    pub(crate) fn intern(data: ValueData) -> Value {
        canonical::pool().canonicalize(data)
    }

    /// Copy-with-change: applies `patch` to a copy of this value's payload
    /// and canonicalizes the result. Returns `self` when the patch is a
    /// no-op, so callers changing several fields pay one canonicalization.
    pub(crate) fn with(&self, patch: impl FnOnce(&mut ValueData)) -> Value {
        let mut data = (*self.0).clone();
        patch(&mut data);
        if data == *self.0 {
            return self.clone();
        }
        Value::intern(data)
    }

    /// The bottom element: no concrete value is possible.
    pub fn make_none() -> Value {
        canonical::pool().singletons().none.clone()
    }

    /// Definitely undefined.
    pub fn make_undef() -> Value {
        canonical::pool().singletons().undef.clone()
    }

    /// Definitely null.
    pub fn make_null() -> Value {
        canonical::pool().singletons().null.clone()
    }

    pub fn make_bool(b: bool) -> Value {
        let s = canonical::pool().singletons();
        if b {
            s.bool_true.clone()
        } else {
            s.bool_false.clone()
        }
    }

    pub fn make_any_bool() -> Value {
        canonical::pool().singletons().bool_any.clone()
    }

    /// The single number `d`; NaN and the infinities fold into their
    /// category values.
    pub fn make_num(d: f64) -> Value {
        if d.is_nan() {
            return Self::make_num_nan();
        }
        if d.is_infinite() {
            return Self::make_num_inf();
        }
        let mut data = ValueData::bottom();
        data.num = Some(d);
        Value::intern(data)
    }

    pub fn make_any_num() -> Value {
        canonical::pool().singletons().num_any.clone()
    }

    /// Any unsigned 32-bit number, zero included.
    pub fn make_any_num_uint() -> Value {
        canonical::pool().singletons().num_uint.clone()
    }

    /// Any non-zero unsigned 32-bit number.
    pub fn make_any_num_uint_pos() -> Value {
        canonical::pool().singletons().num_uint_pos.clone()
    }

    /// Any finite number outside the unsigned 32-bit range.
    pub fn make_any_num_other() -> Value {
        canonical::pool().singletons().num_other.clone()
    }

    /// Any number except NaN and the infinities.
    pub fn make_any_num_not_nan_inf() -> Value {
        canonical::pool().singletons().num_not_nan_inf.clone()
    }

    pub fn make_num_nan() -> Value {
        canonical::pool().singletons().num_nan.clone()
    }

    pub fn make_num_inf() -> Value {
        canonical::pool().singletons().num_inf.clone()
    }

    /// The single string `s`.
    pub fn make_str(s: &str) -> Value {
        let mut data = ValueData::bottom();
        data.str = Some(s.to_string());
        Value::intern(data)
    }

    pub fn make_any_str() -> Value {
        canonical::pool().singletons().str_any.clone()
    }

    pub fn make_any_str_uint() -> Value {
        canonical::pool().singletons().str_uint.clone()
    }

    pub fn make_any_str_other_num() -> Value {
        canonical::pool().singletons().str_other_num.clone()
    }

    /// Any numeric string (array indices and other numeric forms).
    pub fn make_any_str_numeric() -> Value {
        canonical::pool().singletons().str_numeric.clone()
    }

    /// Any string that is not numeric.
    pub fn make_any_str_not_numeric() -> Value {
        canonical::pool().singletons().str_not_numeric.clone()
    }

    /// Any string that is not an array index.
    pub fn make_any_str_not_uint() -> Value {
        canonical::pool().singletons().str_not_uint.clone()
    }

    /// Any identifier string.
    pub fn make_any_str_ident() -> Value {
        canonical::pool().singletons().str_ident.clone()
    }

    /// Any string produced by JSON parsing.
    pub fn make_json_str() -> Value {
        canonical::pool().singletons().str_json.clone()
    }

    /// A possibly-missing property with no other facets.
    pub fn make_absent() -> Value {
        canonical::pool().singletons().absent.clone()
    }

    /// A lazily unresolved property value.
    pub fn make_unknown() -> Value {
        canonical::pool().singletons().unknown.clone()
    }

    /// The single object or symbol `label`.
    pub fn make_object(label: ObjectLabel) -> Value {
        let mut data = ValueData::bottom();
        data.object_labels = Some(PersistentSet::unit(label));
        Value::intern(data)
    }

    /// Any of the objects in `labels`; the set must be non-empty.
    pub fn make_object_set(labels: PersistentSet<ObjectLabel>) -> Value {
        if labels.is_empty() {
            fatal(AnalysisError::EmptyObjectLabelSet);
        }
        let mut data = ValueData::bottom();
        data.object_labels = Some(labels);
        Value::intern(data)
    }

    /// A polymorphic placeholder for `property`, projecting the
    /// absent/present/attribute shape of `value`.
    pub fn make_polymorphic(property: ObjectProperty, value: &Value) -> Value {
        let mut data = ValueData::bottom();
        data.var = Some(property);
        data.flags = value.0.flags
            & (ValueFlags::ABSENT
                | ValueFlags::ATTR
                | ValueFlags::EXTENDEDSCOPE
                | ValueFlags::PRESENT_DATA
                | ValueFlags::PRESENT_ACCESSOR);
        if !value.is_polymorphic() {
            if value.is_maybe_present_data() {
                data.flags |= ValueFlags::PRESENT_DATA;
            }
            if value.is_maybe_present_accessor() {
                data.flags |= ValueFlags::PRESENT_ACCESSOR;
            }
        }
        data.free_variable_partitioning = value.0.free_variable_partitioning.clone();
        Value::intern(data)
    }

    /// Moves the object labels of this value into getter position.
    pub fn make_getter(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            d.getters = d.object_labels.take();
        })
    }

    /// Moves the object labels of this value into setter position.
    pub fn make_setter(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            d.setters = d.object_labels.take();
        })
    }

    /// Marks the value as flowing through an extended scope chain.
    pub fn make_extended_scope(&self) -> Value {
        self.with(|d| d.flags |= ValueFlags::EXTENDEDSCOPE)
    }

    /// Adds the possibility of absence.
    pub fn join_absent(&self) -> Value {
        self.check_not_unknown();
        self.with(|d| d.flags |= ValueFlags::ABSENT)
    }

    /// Replaces the partitioning token.
    pub fn with_free_variable_partitioning(
        &self,
        partitioning: Option<FreeVariablePartitioning>,
    ) -> Value {
        self.with(|d| d.free_variable_partitioning = partitioning)
    }
}

// ============================================================================
// META QUERIES AND ASSERTIONS
// ============================================================================

impl Value {
    /// Whether this is the bottom element. For polymorphic values, bottom
    /// means no absent/present possibility at all.
    pub fn is_none(&self) -> bool {
        if self.is_polymorphic() {
            !self.0.flags.intersects(
                ValueFlags::ABSENT | ValueFlags::PRESENT_DATA | ValueFlags::PRESENT_ACCESSOR,
            )
        } else {
            !self
                .0
                .flags
                .intersects(ValueFlags::PRIMITIVE | ValueFlags::ABSENT | ValueFlags::UNKNOWN)
                && self.0.num.is_none()
                && self.0.str.is_none()
                && self.0.object_labels.is_none()
                && self.0.getters.is_none()
                && self.0.setters.is_none()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.0.flags.contains(ValueFlags::UNKNOWN)
    }

    pub fn is_polymorphic(&self) -> bool {
        self.0.var.is_some()
    }

    pub fn is_polymorphic_or_unknown(&self) -> bool {
        self.is_polymorphic() || self.is_unknown()
    }

    /// The property this polymorphic value stands for.
    pub fn get_object_property(&self) -> Option<&ObjectProperty> {
        self.0.var.as_ref()
    }

    pub fn get_free_variable_partitioning(&self) -> Option<&FreeVariablePartitioning> {
        self.0.free_variable_partitioning.as_ref()
    }

    pub fn check_not_unknown(&self) {
        if self.is_unknown() {
            fatal(AnalysisError::UnexpectedUnknown);
        }
    }

    pub fn check_not_polymorphic_or_unknown(&self) {
        if self.is_unknown() {
            fatal(AnalysisError::UnexpectedUnknown);
        }
        if self.is_polymorphic() {
            fatal(AnalysisError::UnexpectedPolymorphic);
        }
    }

    pub fn check_no_getters_setters(&self) {
        if self.0.getters.is_some() || self.0.setters.is_some() {
            fatal(AnalysisError::UnexpectedAccessor);
        }
    }

    /// Rejects dead flow: a bottom value is an internal error here unless
    /// dead-flow propagation is enabled.
    pub fn check_not_none(&self) {
        if self.is_none() && !Options::get().propagate_dead_flow {
            fatal(AnalysisError::DeadFlow);
        }
    }

    pub fn is_maybe_absent(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ABSENT)
    }

    pub fn is_not_absent(&self) -> bool {
        !self.is_maybe_absent()
    }

    pub fn is_maybe_present(&self) -> bool {
        self.check_not_unknown();
        if self.is_polymorphic() {
            self.0
                .flags
                .intersects(ValueFlags::PRESENT_DATA | ValueFlags::PRESENT_ACCESSOR)
        } else {
            self.is_maybe_present_data() || self.is_maybe_present_accessor()
        }
    }

    pub fn is_maybe_present_data(&self) -> bool {
        self.check_not_unknown();
        if self.is_polymorphic() {
            self.0.flags.contains(ValueFlags::PRESENT_DATA)
        } else {
            self.0.flags.intersects(ValueFlags::PRIMITIVE)
                || self.0.num.is_some()
                || self.0.str.is_some()
                || self.0.object_labels.is_some()
        }
    }

    pub fn is_maybe_present_accessor(&self) -> bool {
        self.check_not_unknown();
        if self.is_polymorphic() {
            self.0.flags.contains(ValueFlags::PRESENT_ACCESSOR)
        } else {
            self.0.getters.is_some() || self.0.setters.is_some()
        }
    }

    pub fn is_extended_scope(&self) -> bool {
        self.0.flags.contains(ValueFlags::EXTENDEDSCOPE)
    }
}

// ============================================================================
// UNDEF / NULL / BOOLEAN QUERIES
// ============================================================================

impl Value {
    pub fn is_maybe_undef(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::UNDEF)
    }

    pub fn is_not_undef(&self) -> bool {
        !self.is_maybe_undef()
    }

    pub fn is_maybe_other_than_undef(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .flags
            .intersects(ValueFlags::NULL | ValueFlags::BOOL | ValueFlags::NUM | ValueFlags::STR)
            || self.0.num.is_some()
            || self.0.str.is_some()
            || self.0.object_labels.is_some()
            || self.0.getters.is_some()
            || self.0.setters.is_some()
    }

    pub fn is_maybe_null(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::NULL)
    }

    pub fn is_not_null(&self) -> bool {
        !self.is_maybe_null()
    }

    pub fn is_maybe_other_than_null(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .flags
            .intersects(ValueFlags::UNDEF | ValueFlags::BOOL | ValueFlags::NUM | ValueFlags::STR)
            || self.0.num.is_some()
            || self.0.str.is_some()
            || self.0.object_labels.is_some()
            || self.0.getters.is_some()
            || self.0.setters.is_some()
    }

    pub fn is_null_or_undef(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.intersects(ValueFlags::UNDEF | ValueFlags::NULL)
            && !self.is_maybe_other_than_undef_or_null()
    }

    fn is_maybe_other_than_undef_or_null(&self) -> bool {
        self.0
            .flags
            .intersects(ValueFlags::BOOL | ValueFlags::NUM | ValueFlags::STR)
            || self.0.num.is_some()
            || self.0.str.is_some()
            || self.0.object_labels.is_some()
            || self.0.getters.is_some()
            || self.0.setters.is_some()
    }

    pub fn is_maybe_any_bool(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::BOOL)
    }

    pub fn is_maybe_true(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::BOOL_TRUE)
    }

    pub fn is_maybe_false(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::BOOL_FALSE)
    }

    pub fn is_not_bool(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        !self.0.flags.intersects(ValueFlags::BOOL)
    }

    pub fn is_maybe_other_than_bool(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .flags
            .intersects(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::NUM | ValueFlags::STR)
            || self.0.num.is_some()
            || self.0.str.is_some()
            || self.0.object_labels.is_some()
            || self.0.getters.is_some()
            || self.0.setters.is_some()
    }
}

// ============================================================================
// NUMBER QUERIES
// ============================================================================

/// The category bit a concrete number belongs to.
pub(crate) fn num_category(d: f64) -> ValueFlags {
    if d.is_nan() {
        ValueFlags::NUM_NAN
    } else if d.is_infinite() {
        ValueFlags::NUM_INF
    } else if d == 0.0 {
        ValueFlags::NUM_ZERO
    } else if is_uint32(d) {
        ValueFlags::NUM_UINT_POS
    } else {
        ValueFlags::NUM_OTHER
    }
}

/// Whether `d` is a whole number in the unsigned 32-bit range.
pub(crate) fn is_uint32(d: f64) -> bool {
    d >= 0.0 && d <= u32::MAX as f64 && d.fract() == 0.0
}

impl Value {
    /// Whether the concrete number `d` is a possible value.
    pub fn is_maybe_num(&self, d: f64) -> bool {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => n == d,
            None => self.0.flags.intersects(num_category(d)),
        }
    }

    /// Whether every number is possible.
    pub fn is_maybe_any_num(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::NUM)
    }

    pub fn is_maybe_single_num(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.num.is_some()
    }

    /// The single concrete number of this value.
    pub fn get_num(&self) -> f64 {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => n,
            None => fatal(AnalysisError::NotSingleNumber),
        }
    }

    pub fn is_maybe_fuzzy_num(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.intersects(ValueFlags::NUM)
    }

    /// Maybe an unsigned 32-bit number (zero included).
    pub fn is_maybe_num_uint(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => is_uint32(n),
            None => self.0.flags.intersects(ValueFlags::NUM_UINT),
        }
    }

    pub fn is_maybe_num_uint_pos(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => n > 0.0 && is_uint32(n),
            None => self.0.flags.intersects(ValueFlags::NUM_UINT_POS),
        }
    }

    pub fn is_maybe_num_other(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => num_category(n) == ValueFlags::NUM_OTHER,
            None => self.0.flags.intersects(ValueFlags::NUM_OTHER),
        }
    }

    pub fn is_maybe_zero(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => n == 0.0,
            None => self.0.flags.intersects(ValueFlags::NUM_ZERO),
        }
    }

    pub fn is_maybe_nan(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::NUM_NAN)
    }

    pub fn is_maybe_inf(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        match self.0.num {
            Some(n) => n.is_infinite(),
            None => self.0.flags.intersects(ValueFlags::NUM_INF),
        }
    }

    pub fn is_not_num(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        !self.0.flags.intersects(ValueFlags::NUM) && self.0.num.is_none()
    }

    pub fn is_maybe_other_than_num(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .flags
            .intersects(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::BOOL | ValueFlags::STR)
            || self.0.str.is_some()
            || self.0.object_labels.is_some()
            || self.0.getters.is_some()
            || self.0.setters.is_some()
    }
}

// ============================================================================
// STRING QUERIES
// ============================================================================

pub(crate) fn str_category_flag(s: &str) -> ValueFlags {
    match strings::categorize(s) {
        StringCategory::ArrayIndex => ValueFlags::STR_UINT,
        StringCategory::OtherNumeric => ValueFlags::STR_OTHERNUM,
        StringCategory::Identifier => ValueFlags::STR_IDENTIFIER,
        StringCategory::OtherIdentifierParts => ValueFlags::STR_OTHERIDENTIFIERPARTS,
        StringCategory::Other => ValueFlags::STR_OTHER,
    }
}

impl Value {
    /// Whether the concrete string `s` is a possible value.
    pub fn is_maybe_str(&self, s: &str) -> bool {
        self.check_not_polymorphic_or_unknown();
        if self
            .0
            .excluded_strings
            .as_ref()
            .is_some_and(|ex| ex.contains(&s.to_string()))
        {
            return false;
        }
        if let Some(included) = &self.0.included_strings {
            return included.contains(&s.to_string());
        }
        if self.0.flags.contains(ValueFlags::STR_JSON) {
            return true;
        }
        if let Some(own) = &self.0.str {
            let hit = if self.0.flags.contains(ValueFlags::STR_PREFIX) {
                s.starts_with(own.as_str())
            } else {
                s == own
            };
            if hit {
                return true;
            }
        }
        self.0.flags.intersects(str_category_flag(s))
    }

    /// Whether every string is possible.
    pub fn is_maybe_any_str(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::STR_CATEGORIES) && self.0.included_strings.is_none()
    }

    pub fn is_maybe_single_str(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.str.is_some() && !self.0.flags.contains(ValueFlags::STR_PREFIX)
    }

    /// The single concrete string of this value.
    pub fn get_str(&self) -> &str {
        self.check_not_polymorphic_or_unknown();
        if self.0.flags.contains(ValueFlags::STR_PREFIX) {
            fatal(AnalysisError::NotSingleString);
        }
        match &self.0.str {
            Some(s) => s,
            None => fatal(AnalysisError::NotSingleString),
        }
    }

    /// The prefix of a prefix-string value.
    pub fn get_prefix(&self) -> &str {
        self.check_not_polymorphic_or_unknown();
        if !self.0.flags.contains(ValueFlags::STR_PREFIX) {
            fatal(AnalysisError::NotSingleString);
        }
        self.0.str.as_deref().unwrap_or_default()
    }

    /// Any fuzzy string possibility (category bits, prefix or JSON).
    pub fn is_maybe_fuzzy_str(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.intersects(ValueFlags::STR)
    }

    pub fn is_maybe_str_uint(&self) -> bool {
        self.may_contain_category(ValueFlags::STR_UINT, StringCategory::ArrayIndex)
    }

    pub fn is_maybe_str_other_num(&self) -> bool {
        self.may_contain_category(ValueFlags::STR_OTHERNUM, StringCategory::OtherNumeric)
    }

    pub fn is_maybe_str_identifier(&self) -> bool {
        self.may_contain_category(ValueFlags::STR_IDENTIFIER, StringCategory::Identifier)
    }

    pub fn is_maybe_str_other_identifier_parts(&self) -> bool {
        self.may_contain_category(
            ValueFlags::STR_OTHERIDENTIFIERPARTS,
            StringCategory::OtherIdentifierParts,
        )
    }

    pub fn is_maybe_str_other(&self) -> bool {
        self.may_contain_category(ValueFlags::STR_OTHER, StringCategory::Other)
    }

    fn may_contain_category(&self, flag: ValueFlags, category: StringCategory) -> bool {
        self.check_not_polymorphic_or_unknown();
        if self.0.flags.intersects(flag) {
            return true;
        }
        match &self.0.str {
            // A prefix extension can land in any category.
            Some(_) if self.0.flags.contains(ValueFlags::STR_PREFIX) => true,
            Some(s) => strings::categorize(s) == category,
            None => false,
        }
    }

    pub fn is_maybe_str_json(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::STR_JSON)
    }

    pub fn is_maybe_str_prefix(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.contains(ValueFlags::STR_PREFIX)
    }

    pub fn is_not_str(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        !self.0.flags.intersects(ValueFlags::STR) && self.0.str.is_none()
    }

    pub fn is_maybe_other_than_str(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .flags
            .intersects(ValueFlags::UNDEF | ValueFlags::NULL | ValueFlags::BOOL | ValueFlags::NUM)
            || self.0.num.is_some()
            || self.0.object_labels.is_some()
            || self.0.getters.is_some()
            || self.0.setters.is_some()
    }

    pub fn get_included_strings(&self) -> Option<&PersistentSet<String>> {
        self.0.included_strings.as_ref()
    }

    pub fn get_excluded_strings(&self) -> Option<&PersistentSet<String>> {
        self.0.excluded_strings.as_ref()
    }

    /// Drops the included/excluded string refinements, keeping the fuzzy
    /// string bits that cover them.
    pub fn forget_excluded_included_strings(&self) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            d.excluded_strings = None;
            d.included_strings = None;
        })
    }
}

// ============================================================================
// OBJECT / SYMBOL / ACCESSOR QUERIES
// ============================================================================

impl Value {
    pub fn get_object_labels(&self) -> Option<&PersistentSet<ObjectLabel>> {
        self.0.object_labels.as_ref()
    }

    pub fn get_getters(&self) -> Option<&PersistentSet<ObjectLabel>> {
        self.0.getters.as_ref()
    }

    pub fn get_setters(&self) -> Option<&PersistentSet<ObjectLabel>> {
        self.0.setters.as_ref()
    }

    /// All labels of this value: data objects, getters and setters.
    pub fn get_all_object_labels(&self) -> PersistentSet<ObjectLabel> {
        let mut all = self
            .0
            .object_labels
            .clone()
            .unwrap_or_default();
        if let Some(g) = &self.0.getters {
            all = all.union(g);
        }
        if let Some(s) = &self.0.setters {
            all = all.union(s);
        }
        all
    }

    /// Maybe a non-symbol object.
    pub fn is_maybe_object(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .object_labels
            .as_ref()
            .is_some_and(|labels| labels.iter().any(|l| l.kind() != LabelKind::Symbol))
    }

    pub fn is_maybe_symbol(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .object_labels
            .as_ref()
            .is_some_and(|labels| labels.iter().any(|l| l.kind() == LabelKind::Symbol))
    }

    pub fn is_maybe_object_or_symbol(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.object_labels.is_some()
    }

    pub fn is_maybe_function(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0
            .object_labels
            .as_ref()
            .is_some_and(|labels| labels.iter().any(|l| l.kind() == LabelKind::Function))
    }

    pub fn is_maybe_primitive(&self) -> bool {
        self.check_not_polymorphic_or_unknown();
        self.0.flags.intersects(ValueFlags::PRIMITIVE)
            || self.0.num.is_some()
            || self.0.str.is_some()
    }

    pub fn is_maybe_getter(&self) -> bool {
        self.check_not_unknown();
        self.0.getters.is_some()
    }

    pub fn is_maybe_setter(&self) -> bool {
        self.check_not_unknown();
        self.0.setters.is_some()
    }

    pub fn is_maybe_getter_or_setter(&self) -> bool {
        self.check_not_unknown();
        self.0.getters.is_some() || self.0.setters.is_some()
    }

    /// Removes `labels` from the object label set.
    pub fn remove_object_labels(&self, labels: &PersistentSet<ObjectLabel>) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            if let Some(own) = &d.object_labels {
                let remaining = own.subtract(labels);
                d.object_labels = (!remaining.is_empty()).then_some(remaining);
            }
        })
    }

    /// Replaces `from` with `to` wherever it occurs in the label sets.
    pub fn replace_object_label(&self, from: &ObjectLabel, to: &ObjectLabel) -> Value {
        if from == to {
            fatal(AnalysisError::ReplaceLabelIdentical);
        }
        self.with(|d| {
            for set in [&mut d.object_labels, &mut d.getters, &mut d.setters] {
                if let Some(s) = set {
                    if s.contains(from) {
                        *s = s.remove(from).add(to.clone());
                    }
                }
            }
        })
    }

    /// Collapses summarized singleton labels in all label sets.
    pub fn summarize(&self, summarized: &Summarized) -> Value {
        self.check_not_polymorphic_or_unknown();
        self.with(|d| {
            for set in [&mut d.object_labels, &mut d.getters, &mut d.setters] {
                if let Some(s) = set {
                    *s = summarized.summarize(s);
                }
            }
        })
    }

    /// Adopts the accessor sets of `other`. The receiver must not already
    /// have accessors; that assertion is the contract of this operation.
    pub fn join_getters_setters(&self, other: &Value) -> Value {
        self.check_no_getters_setters();
        self.with(|d| {
            d.getters = other.0.getters.clone();
            d.setters = other.0.setters.clone();
        })
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

impl Value {
    pub fn is_dont_enum(&self) -> bool {
        self.check_not_unknown();
        self.0.flags & ValueFlags::ATTR_DONTENUM_ANY == ValueFlags::ATTR_DONTENUM
    }

    pub fn is_maybe_dont_enum(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ATTR_DONTENUM)
    }

    pub fn is_not_dont_enum(&self) -> bool {
        self.check_not_unknown();
        self.0.flags & ValueFlags::ATTR_DONTENUM_ANY == ValueFlags::ATTR_NOTDONTENUM
    }

    pub fn is_maybe_not_dont_enum(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ATTR_NOTDONTENUM)
    }

    pub fn is_dont_delete(&self) -> bool {
        self.check_not_unknown();
        self.0.flags & ValueFlags::ATTR_DONTDELETE_ANY == ValueFlags::ATTR_DONTDELETE
    }

    pub fn is_maybe_dont_delete(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ATTR_DONTDELETE)
    }

    pub fn is_not_dont_delete(&self) -> bool {
        self.check_not_unknown();
        self.0.flags & ValueFlags::ATTR_DONTDELETE_ANY == ValueFlags::ATTR_NOTDONTDELETE
    }

    pub fn is_maybe_not_dont_delete(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ATTR_NOTDONTDELETE)
    }

    pub fn is_read_only(&self) -> bool {
        self.check_not_unknown();
        self.0.flags & ValueFlags::ATTR_READONLY_ANY == ValueFlags::ATTR_READONLY
    }

    pub fn is_maybe_read_only(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ATTR_READONLY)
    }

    pub fn is_not_read_only(&self) -> bool {
        self.check_not_unknown();
        self.0.flags & ValueFlags::ATTR_READONLY_ANY == ValueFlags::ATTR_NOTREADONLY
    }

    pub fn is_maybe_not_read_only(&self) -> bool {
        self.check_not_unknown();
        self.0.flags.contains(ValueFlags::ATTR_NOTREADONLY)
    }

    pub fn has_dont_enum(&self) -> bool {
        self.0.flags.intersects(ValueFlags::ATTR_DONTENUM_ANY)
    }

    pub fn has_dont_delete(&self) -> bool {
        self.0.flags.intersects(ValueFlags::ATTR_DONTDELETE_ANY)
    }

    pub fn has_read_only(&self) -> bool {
        self.0.flags.intersects(ValueFlags::ATTR_READONLY_ANY)
    }

    pub fn set_dont_enum(&self, dont_enum: bool) -> Value {
        self.check_not_unknown();
        self.with(|d| {
            d.flags.remove(ValueFlags::ATTR_DONTENUM_ANY);
            d.flags |= if dont_enum {
                ValueFlags::ATTR_DONTENUM
            } else {
                ValueFlags::ATTR_NOTDONTENUM
            };
        })
    }

    pub fn set_dont_delete(&self, dont_delete: bool) -> Value {
        self.check_not_unknown();
        self.with(|d| {
            d.flags.remove(ValueFlags::ATTR_DONTDELETE_ANY);
            d.flags |= if dont_delete {
                ValueFlags::ATTR_DONTDELETE
            } else {
                ValueFlags::ATTR_NOTDONTDELETE
            };
        })
    }

    pub fn set_read_only(&self, read_only: bool) -> Value {
        self.check_not_unknown();
        self.with(|d| {
            d.flags.remove(ValueFlags::ATTR_READONLY_ANY);
            d.flags |= if read_only {
                ValueFlags::ATTR_READONLY
            } else {
                ValueFlags::ATTR_NOTREADONLY
            };
        })
    }

    /// Copies all attribute bits from `other`.
    pub fn set_attributes_from(&self, other: &Value) -> Value {
        self.check_not_unknown();
        other.check_not_unknown();
        self.with(|d| {
            d.flags.remove(ValueFlags::ATTR);
            d.flags |= other.0.flags & ValueFlags::ATTR;
        })
    }

    /// Clears all attribute bits.
    pub fn remove_attributes(&self) -> Value {
        self.check_not_unknown();
        self.with(|d| d.flags.remove(ValueFlags::ATTR))
    }

    /// Clears the property-data bits (attributes, absence, presence,
    /// extended scope).
    pub fn set_bottom_property_data(&self) -> Value {
        self.check_not_unknown();
        self.with(|d| d.flags.remove(ValueFlags::PROPERTYDATA))
    }
}

//! Edge case tests for the value lattice.

#[cfg(test)]
mod tests {
    use sable_util::{PersistentMap, PersistentSet};

    use crate::label::{
        LabelKind, ObjectLabel, ObjectProperty, PropertyKey, SourceLocation, Summarized,
    };
    use crate::options::Options;
    use crate::pkey::PKey;
    use crate::value::Value;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("test.js", line, 1)
    }

    fn obj(line: u32) -> ObjectLabel {
        ObjectLabel::new(LabelKind::Object, loc(line))
    }

    fn func(line: u32) -> ObjectLabel {
        ObjectLabel::new(LabelKind::Function, loc(line))
    }

    fn strings_of(values: &[&str]) -> PersistentSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    // ==================== NUMBERS ====================

    /// EDGE CASE: negative zero is a distinct interned representative
    #[test]
    fn test_edge_negative_zero() {
        let pos = Value::make_num(0.0);
        let neg = Value::make_num(-0.0);
        assert_ne!(pos, neg);
        // but numerically the two compare equal
        assert!(neg.is_maybe_num(0.0));
        let j = pos.join(&neg);
        assert!(!j.is_maybe_single_num());
        assert!(j.is_maybe_zero());
    }

    /// EDGE CASE: NaN and the infinities fold into categories at construction
    #[test]
    fn test_edge_nan_and_inf_constructors() {
        assert_eq!(Value::make_num(f64::NAN), Value::make_num_nan());
        assert_eq!(Value::make_num(f64::INFINITY), Value::make_num_inf());
        assert_eq!(Value::make_num(f64::NEG_INFINITY), Value::make_num_inf());
        assert!(Value::make_num_nan().is_maybe_nan());
        assert!(!Value::make_num_nan().is_maybe_single_num());
    }

    /// EDGE CASE: the uint32 boundary
    #[test]
    fn test_edge_uint_boundary() {
        assert!(Value::make_num(4294967295.0).is_maybe_num_uint_pos());
        assert!(!Value::make_num(4294967296.0).is_maybe_num_uint_pos());
        assert!(Value::make_num(4294967296.0).is_maybe_num_other());
    }

    // ==================== STRINGS ====================

    /// EDGE CASE: the empty string is an other-identifier-parts string
    #[test]
    fn test_edge_empty_string_category() {
        assert!(Value::make_any_str().is_maybe_str(""));
        assert!(Value::make_str("").restrict_to_truthy().is_none());
        assert!(!Value::make_any_str_uint().is_maybe_str(""));
    }

    /// EDGE CASE: a prefix dissolves when joined with fuzzy strings
    #[test]
    fn test_edge_prefix_meets_fuzzy() {
        let prefixed = Value::make_str("abc").join(&Value::make_str("abd"));
        assert!(prefixed.is_maybe_str_prefix());
        assert!(!prefixed.is_maybe_str("zz"));

        let widened = prefixed.join(&Value::make_any_str_ident());
        assert!(!widened.is_maybe_str_prefix());
        // the enumeration is gone with it, so unrelated strings come back
        assert!(widened.is_maybe_str("zz"));
        assert!(widened.is_maybe_str("abczz"));
    }

    /// EDGE CASE: enumerations respect the configured bound
    #[test]
    fn test_edge_included_strings_bound() {
        Options::with(
            Options {
                string_sets_bound: 3,
                ..Options::default()
            },
            || {
                let names = ["alpha", "bravo", "chess", "delta"];
                let v = Value::join_many(
                    &names.map(Value::make_str).to_vec(),
                );
                assert!(v.get_included_strings().is_none());
                assert!(v.is_maybe_str_identifier());
                // precision is gone; the category answers instead
                assert!(v.is_maybe_str("echo"));
            },
        );
    }

    /// EDGE CASE: widening promotes a growing enumeration to absent
    #[test]
    fn test_edge_widening_drops_growing_enumeration() {
        let v = Value::make_str("foo").join(&Value::make_str("bar"));
        let grown = v.join(&Value::make_str("qux"));
        assert_eq!(grown.get_included_strings(), Some(&strings_of(&["foo", "bar", "qux"])));

        let widened = v.join_widening(&Value::make_str("qux"));
        assert!(widened.get_included_strings().is_none());
        assert!(widened.is_maybe_str("qux"));
        assert!(widened.is_maybe_str("anything"));
    }

    /// EDGE CASE: excluded strings widen only when both sides carry them
    #[test]
    fn test_edge_excluded_widening_requires_both_sides() {
        let uints = Value::make_any_str_uint().restrict_to_not_strings(&strings_of(&["7"]));
        let idents = Value::make_any_str_ident().restrict_to_not_strings(&strings_of(&["foo"]));

        // one side with exclusions: the residual survives widening
        let one_sided = uints.join_widening(&Value::make_any_str_ident());
        assert!(!one_sided.is_maybe_str("7"));
        assert!(one_sided.is_maybe_str("8"));

        // both sides with exclusions and a changing residual: collapsed
        let both = uints.join_widening(&idents);
        assert!(both.is_maybe_str("7"));
        assert!(both.is_maybe_str("foo"));

        // without widening the residual is kept exactly
        let plain = uints.join(&idents);
        assert!(!plain.is_maybe_str("7"));
        assert!(!plain.is_maybe_str("foo"));
        assert!(plain.is_maybe_str("8"));
    }

    /// EDGE CASE: disabling string sets disables enumerations and removals
    #[test]
    fn test_edge_no_string_sets() {
        Options::with(
            Options {
                no_string_sets: true,
                ..Options::default()
            },
            || {
                let v = Value::make_str("foo").join(&Value::make_str("bar"));
                assert!(v.get_included_strings().is_none());
                // category precision only
                assert!(v.is_maybe_str("baz"));
                // removal is a silent no-op by policy
                let w = Value::make_any_str();
                assert_eq!(w.restrict_to_not_strings(&strings_of(&["x"])), w);
            },
        );
    }

    /// EDGE CASE: removing strings from an enumeration can collapse it
    #[test]
    fn test_edge_not_strings_collapses_enumeration() {
        let v = Value::make_str("foo").join(&Value::make_str("bar"));
        let single = v.restrict_to_not_strings(&strings_of(&["foo"]));
        assert_eq!(single, Value::make_str("bar"));
        let none = single.restrict_to_not_strings(&strings_of(&["bar"]));
        assert!(none.is_none());
    }

    // ==================== ACCESSORS ====================

    /// EDGE CASE: a getter on the other side blocks equality refinement
    #[test]
    fn test_edge_getter_short_circuits_equality() {
        let getter = Value::make_object(func(1)).make_getter();
        assert!(getter.is_maybe_getter());
        let v = Value::make_num(1.0);
        assert_eq!(v.restrict_to_strict_equals(&getter), v);
    }

    /// EDGE CASE: accessor adoption requires an accessor-free receiver
    #[test]
    fn test_edge_join_getters_setters_adopts() {
        let accessors = Value::make_object(func(1))
            .make_getter()
            .join(&Value::make_object(func(2)).make_setter());
        let v = Value::make_undef().join_getters_setters(&accessors);
        assert!(v.is_maybe_getter());
        assert!(v.is_maybe_setter());
        assert!(v.is_maybe_undef());
    }

    /// EDGE CASE: the accessor-free assertion is the contract
    #[test]
    #[should_panic(expected = "unexpected getter/setter value")]
    fn test_edge_join_getters_setters_rejects_accessor_receiver() {
        let g = Value::make_object(func(1)).make_getter();
        let _ = g.join_getters_setters(&Value::make_undef());
    }

    /// EDGE CASE: accessor restrictions partition the facets
    #[test]
    fn test_edge_accessor_restrictions() {
        let v = Value::make_num(1.0)
            .join(&Value::make_object(func(1)).make_getter());
        let getters_only = v.restrict_to_getter();
        assert_eq!(getters_only.get_getters(), v.get_getters());
        assert!(getters_only.is_not_num());
        assert!(!v.restrict_to_not_getter_setter().is_maybe_getter());
        assert_eq!(
            v.restrict_to_getter_setter().join(&v.restrict_to_not_getter_setter()),
            v
        );
    }

    // ==================== OBJECT LABELS ====================

    /// EDGE CASE: replacing a label with itself is a contract violation
    #[test]
    #[should_panic(expected = "replacing object label with identical label")]
    fn test_edge_replace_label_identical() {
        let v = Value::make_object(obj(1));
        let _ = v.replace_object_label(&obj(1), &obj(1));
    }

    /// EDGE CASE: label replacement reaches accessor sets
    #[test]
    fn test_edge_replace_label() {
        let v = Value::make_object(obj(1))
            .join(&Value::make_object(func(2)).make_getter());
        let r = v.replace_object_label(&obj(1), &obj(9));
        assert!(r.get_object_labels().unwrap().contains(&obj(9)));
        assert!(!r.get_object_labels().unwrap().contains(&obj(1)));
        let r2 = r.replace_object_label(&func(2), &func(8));
        assert!(r2.get_getters().unwrap().contains(&func(8)));
    }

    /// EDGE CASE: summarization collapses singletons inside values
    #[test]
    fn test_edge_summarize_value() {
        let label = obj(4);
        let v = Value::make_object(label.clone());
        let summarized = Summarized::new(
            PersistentSet::unit(label.clone()),
            PersistentSet::unit(label.clone()),
        );
        let s = v.summarize(&summarized);
        let labels = s.get_object_labels().unwrap();
        assert!(!labels.contains(&label));
        assert!(labels.contains(&label.summary()));
    }

    // ==================== POLYMORPHIC AND UNKNOWN ====================

    /// EDGE CASE: polymorphic values carry only the property shape
    #[test]
    fn test_edge_polymorphic_shape() {
        let property = ObjectProperty::new(obj(1), PropertyKey::Ordinary(PKey::string("x")));
        let v = Value::make_num(5.0).join_absent().set_dont_enum(true);
        let p = Value::make_polymorphic(property.clone(), &v);
        assert!(p.is_polymorphic());
        assert!(p.is_maybe_absent());
        assert!(p.is_maybe_present_data());
        assert!(!p.is_maybe_present_accessor());
        assert!(p.is_dont_enum());
        assert_eq!(p.get_object_property(), Some(&property));
        // bottom for a polymorphic value means no absent/present at all
        assert!(!p.is_none());
    }

    /// EDGE CASE: a polymorphic side dissolves into the concrete side
    #[test]
    fn test_edge_polymorphic_joins_concrete() {
        let property = ObjectProperty::new(obj(1), PropertyKey::Ordinary(PKey::string("x")));
        let p = Value::make_polymorphic(property, &Value::make_absent());
        let v = Value::make_num(5.0);
        let j = p.join(&v);
        assert!(!j.is_polymorphic());
        assert!(j.is_maybe_num(5.0));
        assert!(j.is_maybe_absent());
        assert_eq!(j, v.join(&p));
    }

    /// EDGE CASE: polymorphic values of different properties do not join
    #[test]
    #[should_panic(expected = "cannot join polymorphic values of different properties")]
    fn test_edge_polymorphic_mismatch() {
        let pa = ObjectProperty::new(obj(1), PropertyKey::Ordinary(PKey::string("x")));
        let pb = ObjectProperty::new(obj(1), PropertyKey::Ordinary(PKey::string("y")));
        let a = Value::make_polymorphic(pa, &Value::make_absent());
        let b = Value::make_polymorphic(pb, &Value::make_absent());
        let _ = a.join(&b);
    }

    /// EDGE CASE: polymorphic values can be rejected wholesale
    #[test]
    #[should_panic(expected = "polymorphic value constructed while polymorphic values are disabled")]
    fn test_edge_polymorphic_disabled() {
        Options::with(
            Options {
                polymorphic_disabled: true,
                ..Options::default()
            },
            || {
                let property =
                    ObjectProperty::new(obj(1), PropertyKey::Ordinary(PKey::string("x")));
                let _ = Value::make_polymorphic(property, &Value::make_absent());
            },
        );
    }

    /// EDGE CASE: unknown loses every join
    #[test]
    fn test_edge_unknown_join() {
        let v = Value::make_num(1.0);
        assert_eq!(Value::make_unknown().join(&v), v);
        assert_eq!(v.join(&Value::make_unknown()), v);
    }

    /// EDGE CASE: facet queries reject unknown
    #[test]
    #[should_panic(expected = "operation applied to unknown value")]
    fn test_edge_unknown_query_rejected() {
        let _ = Value::make_unknown().is_maybe_undef();
    }

    // ==================== DEAD FLOW ====================

    /// EDGE CASE: bottom trips the dead-flow assertion unless allowed
    #[test]
    #[should_panic(expected = "unexpected dead flow")]
    fn test_edge_dead_flow_rejected() {
        Value::make_none().check_not_none();
    }

    #[test]
    fn test_edge_dead_flow_allowed() {
        Options::with(
            Options {
                propagate_dead_flow: true,
                ..Options::default()
            },
            || Value::make_none().check_not_none(),
        );
    }

    // ==================== ATTRIBUTES ====================

    /// EDGE CASE: attribute states are tri-valued
    #[test]
    fn test_edge_attribute_states() {
        let v = Value::make_num(1.0);
        assert!(!v.has_dont_enum());
        let yes = v.set_dont_enum(true);
        assert!(yes.is_dont_enum());
        assert!(!yes.is_not_dont_enum());
        let maybe = yes.join(&v.set_dont_enum(false));
        assert!(maybe.is_maybe_dont_enum());
        assert!(maybe.is_maybe_not_dont_enum());
        assert!(!maybe.is_dont_enum());
        assert_eq!(maybe.attributes_string(), "(dontenum=maybe,dontdelete=bottom,readonly=bottom)");
        assert_eq!(maybe.remove_attributes(), v);
    }

    /// EDGE CASE: attributes copy wholesale
    #[test]
    fn test_edge_set_attributes_from() {
        let template = Value::make_undef()
            .set_dont_enum(true)
            .set_dont_delete(false)
            .set_read_only(true);
        let v = Value::make_num(2.0).set_attributes_from(&template);
        assert!(v.is_dont_enum());
        assert!(v.is_not_dont_delete());
        assert!(v.is_read_only());
        assert_eq!(v.set_bottom_property_data(), Value::make_num(2.0));
    }

    /// EDGE CASE: the extended-scope mark rides along joins and restrictions
    #[test]
    fn test_edge_extended_scope() {
        let v = Value::make_num(3.0).make_extended_scope();
        assert!(v.is_extended_scope());
        assert!(v.join(&Value::make_undef()).is_extended_scope());
        assert!(v.restrict_to_not_num().is_extended_scope());
        assert!(!v.restrict_to_num().is_extended_scope());
    }

    // ==================== DIAGNOSTICS ====================

    /// EDGE CASE: printed forms
    #[test]
    fn test_edge_display() {
        assert_eq!(Value::make_none().to_string(), "<no value>");
        assert_eq!(Value::make_unknown().to_string(), "?");
        assert_eq!(Value::make_str("foo").to_string(), "\"foo\"");
        assert_eq!(Value::make_num(5.0).to_string(), "5");
        assert_eq!(Value::make_num(-1.5).to_string(), "-1.5");
        assert_eq!(Value::make_any_bool().to_string(), "Bool");
        assert_eq!(Value::make_any_num().to_string(), "Num");
        assert_eq!(Value::make_any_num_uint().to_string(), "UInt");
        assert_eq!(Value::make_any_str().to_string(), "Str");
        assert_eq!(Value::make_json_str().to_string(), "JSONStr");
        assert_eq!(Value::make_absent().to_string(), "absent");
        assert_eq!(
            Value::make_undef().join(&Value::make_null()).to_string(),
            "Undef|Null"
        );
        assert_eq!(
            Value::make_str("foo").join(&Value::make_str("bar")).to_string(),
            "(IdentStr){\"bar\",\"foo\"}"
        );
        assert_eq!(
            Value::make_str("file_a").join(&Value::make_str("file_b")).to_string(),
            "(PrefixStr[\"file_\"]){\"file_a\",\"file_b\"}"
        );
        assert_eq!(
            Value::make_any_str().restrict_to_not_strings(&strings_of(&["x"])).to_string(),
            "(Str)\\{\"x\"}"
        );
        assert_eq!(
            Value::make_object(obj(3)).to_string(),
            "{Object#test.js:3:1}"
        );
    }

    /// EDGE CASE: diff subtracts what the smaller value already covers
    #[test]
    fn test_edge_diff() {
        let small = Value::make_undef();
        let big = small.join(&Value::make_num(5.0));
        let mut out = String::new();
        big.diff(&small, &mut out);
        assert_eq!(out, "5");
    }

    // ==================== COLLABORATORS ====================

    /// EDGE CASE: property keys become values
    #[test]
    fn test_edge_pkey_to_value() {
        assert_eq!(PKey::string("foo").to_value(), Value::make_str("foo"));
        let symbol = ObjectLabel::new(LabelKind::Symbol, loc(9));
        let v = PKey::symbol(symbol.clone()).to_value();
        assert!(v.is_maybe_symbol());
        assert!(!v.is_maybe_object());
        assert_eq!(v, Value::make_object(symbol));
    }

    /// EDGE CASE: lattice-valued maps join per key
    #[test]
    fn test_edge_value_map_weak_update() {
        let m: PersistentMap<String, Value> =
            PersistentMap::empty().insert("x".to_string(), Value::make_num(1.0));
        let m2 = m.weak_update("x".to_string(), Value::make_num(2.0));
        let joined = m2.get(&"x".to_string()).unwrap();
        assert!(joined.is_maybe_num(1.0));
        assert!(joined.is_maybe_num(2.0));
        assert_eq!(joined, &Value::make_num(1.0).join(&Value::make_num(2.0)));
    }

    /// EDGE CASE: typeof-object restrictions split kinds
    #[test]
    fn test_edge_typeof_object_partition() {
        let v = Value::make_object(obj(1))
            .join(&Value::make_object(func(2)))
            .join(&Value::make_null());
        let objects = v.restrict_to_typeof_object();
        assert!(objects.is_maybe_object());
        assert!(!objects.is_maybe_function());
        assert!(objects.is_not_null());
        assert_eq!(objects.join(&v.restrict_to_not_typeof_object()), v);
    }
}

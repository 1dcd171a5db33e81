//! Human-readable printing of values.
//!
//! `Display` renders a value as a union expression over its facets, e.g.
//! `Undef|true|0.5|UIntStr|{Object#main.js:1:5}`. The bottom value prints
//! as `<no value>`, unknown as `?`, and a polymorphic value as
//! `^(property[absent|present])`. String refinements wrap the expression:
//! `(Str)\{"a"}` for exclusions, `(IdentStr){"foo","bar"}` for an
//! exhaustive enumeration. Label sets print sorted, so output is
//! deterministic.

use std::fmt;

use sable_util::PersistentSet;

use crate::label::ObjectLabel;

use super::{Value, ValueData, ValueFlags};

fn push_num_pieces(d: &ValueData, pieces: &mut Vec<String>) {
    if let Some(n) = d.num {
        pieces.push(n.to_string());
        return;
    }
    let f = d.flags;
    if f.contains(ValueFlags::NUM) {
        pieces.push("Num".to_string());
        return;
    }
    if f.contains(ValueFlags::NUM_UINT) {
        pieces.push("UInt".to_string());
    } else if f.contains(ValueFlags::NUM_ZERO) {
        pieces.push("Zero".to_string());
    } else if f.contains(ValueFlags::NUM_UINT_POS) {
        pieces.push("UIntPos".to_string());
    }
    if f.contains(ValueFlags::NUM_OTHER) {
        pieces.push("NotUInt".to_string());
    }
    if f.contains(ValueFlags::NUM_NAN) {
        pieces.push("NaN".to_string());
    }
    if f.contains(ValueFlags::NUM_INF) {
        pieces.push("Inf".to_string());
    }
}

fn push_str_pieces(d: &ValueData, pieces: &mut Vec<String>) {
    let f = d.flags;
    if let Some(s) = &d.str {
        if f.contains(ValueFlags::STR_PREFIX) {
            pieces.push(format!("PrefixStr[\"{s}\"]"));
        } else {
            pieces.push(format!("\"{s}\""));
        }
    }
    if f.contains(ValueFlags::STR_CATEGORIES) {
        pieces.push("Str".to_string());
    } else {
        let non_uint = ValueFlags::STR_OTHERNUM
            | ValueFlags::STR_IDENTIFIER
            | ValueFlags::STR_OTHERIDENTIFIERPARTS
            | ValueFlags::STR_OTHER;
        if f.contains(non_uint) {
            pieces.push("NotUIntStr".to_string());
        } else {
            if f.contains(ValueFlags::STR_OTHERNUM) {
                pieces.push("OtherNumStr".to_string());
            }
            if f.contains(ValueFlags::STR_IDENTIFIER) {
                pieces.push("IdentStr".to_string());
            }
            if f.contains(ValueFlags::STR_OTHERIDENTIFIERPARTS) {
                pieces.push("OtherIdentPartsStr".to_string());
            }
            if f.contains(ValueFlags::STR_OTHER) {
                pieces.push("OtherStr".to_string());
            }
        }
        if f.contains(ValueFlags::STR_UINT) {
            pieces.push("UIntStr".to_string());
        }
    }
    if f.contains(ValueFlags::STR_JSON) {
        pieces.push("JSONStr".to_string());
    }
}

fn label_set_string(labels: &PersistentSet<ObjectLabel>) -> String {
    let mut names: Vec<String> = labels.iter().map(ObjectLabel::to_string).collect();
    names.sort();
    format!("{{{}}}", names.join(","))
}

fn sorted_string_set(set: &PersistentSet<String>) -> String {
    let mut items: Vec<String> = set.iter().map(|s| format!("\"{s}\"")).collect();
    items.sort();
    items.join(",")
}

fn pieces(d: &ValueData) -> Vec<String> {
    let mut pieces = Vec::new();
    if d.flags.contains(ValueFlags::UNDEF) {
        pieces.push("Undef".to_string());
    }
    if d.flags.contains(ValueFlags::NULL) {
        pieces.push("Null".to_string());
    }
    if d.flags.contains(ValueFlags::BOOL) {
        pieces.push("Bool".to_string());
    } else if d.flags.contains(ValueFlags::BOOL_TRUE) {
        pieces.push("true".to_string());
    } else if d.flags.contains(ValueFlags::BOOL_FALSE) {
        pieces.push("false".to_string());
    }
    push_num_pieces(d, &mut pieces);
    push_str_pieces(d, &mut pieces);
    if let Some(labels) = &d.object_labels {
        pieces.push(label_set_string(labels));
    }
    if let Some(getters) = &d.getters {
        pieces.push(format!("getter {}", label_set_string(getters)));
    }
    if let Some(setters) = &d.setters {
        pieces.push(format!("setter {}", label_set_string(setters)));
    }
    if d.flags.contains(ValueFlags::ABSENT) {
        pieces.push("absent".to_string());
    }
    pieces
}

fn write_value(d: &ValueData, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if d.flags.contains(ValueFlags::UNKNOWN) {
        return write!(f, "?");
    }
    if let Some(var) = &d.var {
        let mut states = Vec::new();
        if d.flags.contains(ValueFlags::ABSENT) {
            states.push("absent");
        }
        if d
            .flags
            .intersects(ValueFlags::PRESENT_DATA | ValueFlags::PRESENT_ACCESSOR)
        {
            states.push("present");
        }
        return write!(f, "^({var}[{}])", states.join("|"));
    }
    let parts = pieces(d);
    if parts.is_empty() {
        return write!(f, "<no value>");
    }
    let body = parts.join("|");
    if let Some(excluded) = &d.excluded_strings {
        write!(f, "({body})\\{{{}}}", sorted_string_set(excluded))
    } else if let Some(included) = &d.included_strings {
        write!(f, "({body}){{{}}}", sorted_string_set(included))
    } else {
        write!(f, "{body}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(&self.0, f)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}

impl Value {
    /// The raw flag set, for debugging.
    pub fn flags_string(&self) -> String {
        format!("{:?}", self.0.flags)
    }

    /// The attribute part of this value, for debugging.
    pub fn attributes_string(&self) -> String {
        fn state(maybe_set: bool, maybe_clear: bool) -> &'static str {
            match (maybe_set, maybe_clear) {
                (true, false) => "yes",
                (false, true) => "no",
                (true, true) => "maybe",
                (false, false) => "bottom",
            }
        }
        let f = self.0.flags;
        format!(
            "(dontenum={},dontdelete={},readonly={})",
            state(
                f.contains(ValueFlags::ATTR_DONTENUM),
                f.contains(ValueFlags::ATTR_NOTDONTENUM)
            ),
            state(
                f.contains(ValueFlags::ATTR_DONTDELETE),
                f.contains(ValueFlags::ATTR_NOTDONTDELETE)
            ),
            state(
                f.contains(ValueFlags::ATTR_READONLY),
                f.contains(ValueFlags::ATTR_NOTREADONLY)
            ),
        )
    }

    /// Appends to `out` a print of this value with everything already in
    /// `old` subtracted: flags present in `old` and set elements `old`
    /// shares are omitted. Used for compact state diffs in solver traces.
    pub fn diff(&self, old: &Value, out: &mut String) {
        let mut d = (*self.0).clone();
        d.flags.remove(old.0.flags & !ValueFlags::STR_PREFIX);
        if d.num.map(f64::to_bits) == old.0.num.map(f64::to_bits) {
            d.num = None;
        }
        if d.str == old.0.str {
            d.str = None;
            d.flags.remove(ValueFlags::STR_PREFIX);
        }
        for (mine, theirs) in [
            (&mut d.object_labels, &old.0.object_labels),
            (&mut d.getters, &old.0.getters),
            (&mut d.setters, &old.0.setters),
        ] {
            if let (Some(m), Some(t)) = (mine.as_ref(), theirs.as_ref()) {
                let rest = m.subtract(t);
                *mine = (!rest.is_empty()).then_some(rest);
            }
        }
        for (mine, theirs) in [
            (&mut d.excluded_strings, &old.0.excluded_strings),
            (&mut d.included_strings, &old.0.included_strings),
        ] {
            if let (Some(m), Some(t)) = (mine.as_ref(), theirs.as_ref()) {
                let rest = m.subtract(t);
                *mine = (!rest.is_empty()).then_some(rest);
            }
        }
        struct DiffPrint(ValueData);
        impl fmt::Display for DiffPrint {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_value(&self.0, f)
            }
        }
        out.push_str(&DiffPrint(d).to_string());
    }
}

//! Predicates over concrete strings.
//!
//! The string facet of a value classifies every concrete string into exactly
//! one category: array index, other numeric, identifier, other
//! identifier-parts, or other. The classification is first-match in that
//! order (see [`categorize`]), so strings like `"Infinity"` count as numeric
//! rather than as identifiers, and `""` lands in other identifier-parts.

/// Whether `s` is the canonical decimal representation of a 32-bit unsigned
/// integer, i.e. a valid array index.
pub fn is_array_index(s: &str) -> bool {
    if s.is_empty() || s.len() > 10 {
        return false;
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // canonical form has no leading zero
    if s.len() > 1 && s.starts_with('0') {
        return false;
    }
    s.parse::<u32>().is_ok()
}

/// Whether the scripting language parses `s` as a number literal.
///
/// Decimal notation only (optional sign, fraction, exponent) plus the
/// `NaN`/`Infinity` spellings; hex literals are not number *literals* in
/// string position and are left to [`numeric_value`].
pub fn is_numeric(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if matches!(s, "NaN" | "Infinity" | "+Infinity" | "-Infinity") {
        return true;
    }
    s.bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
        && s.parse::<f64>().is_ok()
}

/// Whether `s` is an identifier: a leading letter, `$` or `_`, followed by
/// letters, digits, `$` or `_`.
pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'$' || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'$' || b == b'_')
}

/// Whether every character of `s` may occur inside an identifier.
///
/// Vacuously true for the empty string.
pub fn is_identifier_parts(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'$' || b == b'_')
}

/// Identifier-parts strings that are neither identifiers nor array indices.
pub fn is_other_identifier_parts(s: &str) -> bool {
    is_identifier_parts(s) && !is_identifier(s) && !is_array_index(s)
}

/// Whether `s` contains a character that can never occur in the string form
/// of a number (digits, sign, decimal point, exponent, and the letters of
/// `Infinity` and `NaN`).
pub fn contains_non_number_characters(s: &str) -> bool {
    !s.bytes().all(|b| {
        matches!(
            b,
            b'0'..=b'9'
                | b'+'
                | b'-'
                | b'.'
                | b'e'
                | b'E'
                | b'I'
                | b'n'
                | b'f'
                | b'i'
                | b't'
                | b'y'
                | b'N'
                | b'a'
        )
    })
}

/// The longest common prefix of `a` and `b`, on a character boundary.
pub fn shared_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let n = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    let mut end = n;
    while !a.is_char_boundary(end) {
        end -= 1;
    }
    &a[..end]
}

/// The number the scripting language coerces `s` to, or `None` when the
/// coercion yields NaN.
///
/// Coercion trims whitespace, maps the empty string to `0`, and accepts
/// decimal and hex notation.
pub fn numeric_value(s: &str) -> Option<f64> {
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if t.is_empty() {
        return Some(0.0);
    }
    match t {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    if !t
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    t.parse::<f64>().ok().filter(|d| !d.is_nan())
}

/// The category a concrete string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringCategory {
    ArrayIndex,
    OtherNumeric,
    Identifier,
    OtherIdentifierParts,
    Other,
}

/// First-match classification; the five categories partition all strings.
pub(crate) fn categorize(s: &str) -> StringCategory {
    if is_array_index(s) {
        StringCategory::ArrayIndex
    } else if is_numeric(s) {
        StringCategory::OtherNumeric
    } else if is_identifier(s) {
        StringCategory::Identifier
    } else if is_identifier_parts(s) {
        StringCategory::OtherIdentifierParts
    } else {
        StringCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_index() {
        assert!(is_array_index("0"));
        assert!(is_array_index("1"));
        assert!(is_array_index("42"));
        assert!(is_array_index("4294967295"));
        assert!(!is_array_index("4294967296"));
        assert!(!is_array_index("01"));
        assert!(!is_array_index("-1"));
        assert!(!is_array_index(""));
        assert!(!is_array_index("1.0"));
        assert!(!is_array_index("007"));
    }

    #[test]
    fn test_numeric() {
        assert!(is_numeric("0"));
        assert!(is_numeric("-1"));
        assert!(is_numeric("2.5"));
        assert!(is_numeric(".5"));
        assert!(is_numeric("1e10"));
        assert!(is_numeric("NaN"));
        assert!(is_numeric("Infinity"));
        assert!(is_numeric("-Infinity"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("1x"));
        assert!(!is_numeric("infinity"));
        assert!(!is_numeric("1 "));
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("$jq"));
        assert!(is_identifier("foo123"));
        assert!(!is_identifier("1foo"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_identifier_parts() {
        assert!(is_identifier_parts(""));
        assert!(is_identifier_parts("1foo"));
        assert!(is_identifier_parts("0x"));
        assert!(!is_identifier_parts("a b"));

        assert!(is_other_identifier_parts(""));
        assert!(is_other_identifier_parts("1foo"));
        assert!(!is_other_identifier_parts("foo"));
        assert!(!is_other_identifier_parts("12"));
    }

    #[test]
    fn test_contains_non_number_characters() {
        assert!(!contains_non_number_characters("123"));
        assert!(!contains_non_number_characters("-1.5e3"));
        assert!(!contains_non_number_characters("Infinity"));
        assert!(!contains_non_number_characters("NaN"));
        assert!(contains_non_number_characters("12px"));
        assert!(contains_non_number_characters("foo"));
        assert!(contains_non_number_characters(" 1"));
    }

    #[test]
    fn test_shared_prefix() {
        assert_eq!(shared_prefix("file_a", "file_b"), "file_");
        assert_eq!(shared_prefix("foo", "bar"), "");
        assert_eq!(shared_prefix("abc", "abc"), "abc");
        assert_eq!(shared_prefix("abc", "abcdef"), "abc");
        assert_eq!(shared_prefix("", "x"), "");
        // never splits a multi-byte character
        assert_eq!(shared_prefix("aé", "aè"), "a");
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value("5"), Some(5.0));
        assert_eq!(numeric_value(""), Some(0.0));
        assert_eq!(numeric_value(" 7 "), Some(7.0));
        assert_eq!(numeric_value("2.5"), Some(2.5));
        assert_eq!(numeric_value("0x10"), Some(16.0));
        assert_eq!(numeric_value("1e3"), Some(1000.0));
        assert_eq!(numeric_value("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(numeric_value("foo"), None);
        assert_eq!(numeric_value("NaN"), None);
        assert_eq!(numeric_value("12px"), None);
    }

    #[test]
    fn test_categorize_partitions() {
        assert_eq!(categorize("7"), StringCategory::ArrayIndex);
        assert_eq!(categorize("-7"), StringCategory::OtherNumeric);
        assert_eq!(categorize("Infinity"), StringCategory::OtherNumeric);
        assert_eq!(categorize("NaN"), StringCategory::OtherNumeric);
        assert_eq!(categorize("foo"), StringCategory::Identifier);
        assert_eq!(categorize("1foo"), StringCategory::OtherIdentifierParts);
        assert_eq!(categorize(""), StringCategory::OtherIdentifierParts);
        assert_eq!(categorize("a b"), StringCategory::Other);
        assert_eq!(categorize("{}"), StringCategory::Other);
    }
}

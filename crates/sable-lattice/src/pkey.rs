//! Property keys.
//!
//! Properties are keyed either by a concrete string or by a symbol object.

use std::fmt;
use std::sync::Arc;

use crate::label::ObjectLabel;
use crate::value::Value;

/// A concrete property key: a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PKey {
    String(Arc<str>),
    Symbol(ObjectLabel),
}

impl PKey {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        PKey::String(s.into())
    }

    pub fn symbol(label: ObjectLabel) -> Self {
        PKey::Symbol(label)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, PKey::String(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PKey::String(s) => Some(s),
            PKey::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&ObjectLabel> {
        match self {
            PKey::String(_) => None,
            PKey::Symbol(label) => Some(label),
        }
    }

    /// The key as an abstract value: a single string, or the symbol object.
    pub fn to_value(&self) -> Value {
        match self {
            PKey::String(s) => Value::make_str(s),
            PKey::Symbol(label) => Value::make_object(label.clone()),
        }
    }
}

impl fmt::Display for PKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PKey::String(s) => write!(f, "{s}"),
            PKey::Symbol(label) => write!(f, "{label}"),
        }
    }
}

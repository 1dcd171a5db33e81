//! Object labels and the tokens that travel with them.
//!
//! An [`ObjectLabel`] stands for a set of runtime objects allocated at one
//! program point. A *singleton* label stands for exactly one object and may
//! be strongly updated; its [`summary`](ObjectLabel::summary) counterpart
//! stands for any number of objects from the same point. The lattice treats
//! labels as opaque tokens: it only consults their kind, singleton-ness,
//! host metadata and source location, and it never invents new ones.

use std::fmt;
use std::sync::Arc;

use sable_util::PersistentSet;

use crate::pkey::PKey;

/// The kind of object a label describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelKind {
    Object,
    Function,
    Array,
    Symbol,
    Date,
    RegExp,
    Error,
    Boolean,
    Number,
    String,
    Arguments,
}

impl LabelKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            LabelKind::Object => "Object",
            LabelKind::Function => "Function",
            LabelKind::Array => "Array",
            LabelKind::Symbol => "Symbol",
            LabelKind::Date => "Date",
            LabelKind::RegExp => "RegExp",
            LabelKind::Error => "Error",
            LabelKind::Boolean => "Boolean",
            LabelKind::Number => "Number",
            LabelKind::String => "String",
            LabelKind::Arguments => "Arguments",
        }
    }
}

/// The API family a host object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostApi {
    Native,
    Dom,
}

impl HostApi {
    pub fn short_name(self) -> &'static str {
        match self {
            HostApi::Native => "native",
            HostApi::Dom => "dom",
        }
    }
}

/// A position in an analyzed source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    file: Arc<str>,
    line: u32,
    column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct LabelData {
    kind: LabelKind,
    singleton: bool,
    host: Option<HostApi>,
    location: SourceLocation,
}

/// An abstract object identity.
///
/// Labels compare and hash by content; cloning shares the underlying
/// allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectLabel(Arc<LabelData>);

impl ObjectLabel {
    /// A singleton label for an object allocated at `location`.
    pub fn new(kind: LabelKind, location: SourceLocation) -> Self {
        Self(Arc::new(LabelData {
            kind,
            singleton: true,
            host: None,
            location,
        }))
    }

    /// A singleton label for a host-provided object.
    pub fn host(kind: LabelKind, api: HostApi, location: SourceLocation) -> Self {
        Self(Arc::new(LabelData {
            kind,
            singleton: true,
            host: Some(api),
            location,
        }))
    }

    pub fn kind(&self) -> LabelKind {
        self.0.kind
    }

    pub fn is_singleton(&self) -> bool {
        self.0.singleton
    }

    pub fn is_host_object(&self) -> bool {
        self.0.host.is_some()
    }

    pub fn host_api(&self) -> Option<HostApi> {
        self.0.host
    }

    pub fn source_location(&self) -> &SourceLocation {
        &self.0.location
    }

    /// The summary counterpart of this label, covering every object from the
    /// same allocation point. Idempotent.
    pub fn summary(&self) -> ObjectLabel {
        if !self.0.singleton {
            return self.clone();
        }
        Self(Arc::new(LabelData {
            singleton: false,
            ..(*self.0).clone()
        }))
    }
}

impl fmt::Display for ObjectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(api) = self.0.host {
            write!(f, "%{}:{}", api.short_name(), self.0.kind.name())?;
        } else {
            write!(f, "{}#{}", self.0.kind.name(), self.0.location)?;
        }
        if !self.0.singleton {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// The key part of a property reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// A named or symbol-keyed property.
    Ordinary(PKey),
    /// The collapsed numeric default property.
    DefaultNumeric,
    /// The collapsed non-numeric default property.
    DefaultOther,
    /// The internal primitive value slot.
    InternalValue,
    /// The internal prototype slot.
    InternalPrototype,
    /// The internal scope-chain slot.
    InternalScope,
}

/// A reference to one property of one abstract object; the `var` target of a
/// polymorphic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectProperty {
    label: ObjectLabel,
    key: PropertyKey,
}

impl ObjectProperty {
    pub fn new(label: ObjectLabel, key: PropertyKey) -> Self {
        Self { label, key }
    }

    pub fn label(&self) -> &ObjectLabel {
        &self.label
    }

    pub fn key(&self) -> &PropertyKey {
        &self.key
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Ordinary(key) => write!(f, "{key}"),
            PropertyKey::DefaultNumeric => write!(f, "[[default-numeric]]"),
            PropertyKey::DefaultOther => write!(f, "[[default-other]]"),
            PropertyKey::InternalValue => write!(f, "[[value]]"),
            PropertyKey::InternalPrototype => write!(f, "[[prototype]]"),
            PropertyKey::InternalScope => write!(f, "[[scope]]"),
        }
    }
}

impl fmt::Display for ObjectProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.label, self.key)
    }
}

/// The sets of object labels that have been summarized on the current path.
///
/// Produced by the state abstraction when singleton objects flow past their
/// allocation site again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summarized {
    maybe_summarized: PersistentSet<ObjectLabel>,
    definitely_summarized: PersistentSet<ObjectLabel>,
}

impl Summarized {
    pub fn new(
        maybe_summarized: PersistentSet<ObjectLabel>,
        definitely_summarized: PersistentSet<ObjectLabel>,
    ) -> Self {
        Self {
            maybe_summarized,
            definitely_summarized,
        }
    }

    pub fn is_maybe_summarized(&self, label: &ObjectLabel) -> bool {
        self.maybe_summarized.contains(label)
    }

    pub fn is_definitely_summarized(&self, label: &ObjectLabel) -> bool {
        self.definitely_summarized.contains(label)
    }

    /// Collapses summarized singletons in `labels`: a maybe-summarized
    /// singleton contributes its summary label alongside itself, and a
    /// definitely-summarized singleton is replaced by it.
    pub fn summarize(
        &self,
        labels: &PersistentSet<ObjectLabel>,
    ) -> PersistentSet<ObjectLabel> {
        let mut result = labels.clone();
        for label in labels.iter() {
            if label.is_singleton() && self.is_maybe_summarized(label) {
                result = result.add(label.summary());
                if self.is_definitely_summarized(label) {
                    result = result.remove(label);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("main.js", line, 1)
    }

    #[test]
    fn test_label_identity() {
        let a = ObjectLabel::new(LabelKind::Object, loc(1));
        let b = ObjectLabel::new(LabelKind::Object, loc(1));
        let c = ObjectLabel::new(LabelKind::Object, loc(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, a.summary());
    }

    #[test]
    fn test_summary_idempotent() {
        let a = ObjectLabel::new(LabelKind::Array, loc(3));
        let s = a.summary();
        assert!(!s.is_singleton());
        assert_eq!(s.summary(), s);
        assert_eq!(s.kind(), LabelKind::Array);
    }

    #[test]
    fn test_display() {
        let a = ObjectLabel::new(LabelKind::Function, loc(10));
        assert_eq!(a.to_string(), "Function#main.js:10:1");
        assert_eq!(a.summary().to_string(), "Function#main.js:10:1*");
        let h = ObjectLabel::host(LabelKind::Object, HostApi::Native, loc(0));
        assert_eq!(h.to_string(), "%native:Object");
    }

    #[test]
    fn test_summarize() {
        let a = ObjectLabel::new(LabelKind::Object, loc(1));
        let b = ObjectLabel::new(LabelKind::Object, loc(2));
        let maybe = PersistentSet::unit(a.clone());
        let definitely = PersistentSet::unit(a.clone());

        let weak = Summarized::new(maybe.clone(), PersistentSet::empty());
        let labels: PersistentSet<ObjectLabel> =
            [a.clone(), b.clone()].into_iter().collect();

        let weakened = weak.summarize(&labels);
        assert!(weakened.contains(&a));
        assert!(weakened.contains(&a.summary()));
        assert!(weakened.contains(&b));

        let strong = Summarized::new(maybe, definitely);
        let strongly = strong.summarize(&labels);
        assert!(!strongly.contains(&a));
        assert!(strongly.contains(&a.summary()));
        assert!(strongly.contains(&b));
    }
}

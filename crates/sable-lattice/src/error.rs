//! Core error types for the lattice crate.
//!
//! Every variant of [`AnalysisError`] marks a broken contract between the
//! lattice and the transfer functions driving it, not a problem with the
//! analyzed program. They are fatal to the current analysis run: the lattice
//! performs no retry or recovery, so violations are raised by panicking with
//! the formatted error via [`fatal`].

use thiserror::Error;

/// Internal contract violations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A freshly constructed value failed a representation invariant.
    #[error("representation invariant broken: {0}")]
    InvariantBroken(String),

    /// An operation that requires a known value was given `unknown`.
    #[error("operation applied to unknown value")]
    UnexpectedUnknown,

    /// An operation that forbids polymorphic values was given one.
    #[error("operation applied to polymorphic value")]
    UnexpectedPolymorphic,

    /// Two polymorphic values with different property origins were joined.
    #[error("cannot join polymorphic values of different properties")]
    PolymorphicMismatch,

    /// A polymorphic value reached the canonicalizer while polymorphic
    /// values are disabled.
    #[error("polymorphic value constructed while polymorphic values are disabled")]
    PolymorphicDisabled,

    /// A single concrete string was requested from a value that does not
    /// hold exactly one string.
    #[error("string requested from a value that is not a single string")]
    NotSingleString,

    /// A single concrete number was requested from a value that does not
    /// hold exactly one number.
    #[error("number requested from a value that is not a single number")]
    NotSingleNumber,

    /// An operation that forbids accessors was given a value with getters
    /// or setters.
    #[error("unexpected getter/setter value")]
    UnexpectedAccessor,

    /// A constructor was given an empty object label set.
    #[error("empty object label set")]
    EmptyObjectLabelSet,

    /// `replace_object_label` was called with identical source and target.
    #[error("replacing object label with identical label")]
    ReplaceLabelIdentical,

    /// An empty value reached an operation that expects live flow, and
    /// dead-flow propagation is not enabled.
    #[error("unexpected dead flow")]
    DeadFlow,
}

/// Raises a contract violation.
///
/// Violations indicate programmer error in the calling transfer functions
/// and abort the analysis run.
#[cold]
pub(crate) fn fatal(err: AnalysisError) -> ! {
    panic!("{err}")
}

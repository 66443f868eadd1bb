//! Error types for vault-types.

use thiserror::Error;

/// Failure to parse a domain enum from its string token.
///
/// Returned by the `FromStr` impls on [`Platform`], [`ContentType`],
/// [`SourceKind`], [`Credibility`], [`Severity`], and [`CorrectionStatus`].
///
/// [`Platform`]: crate::Platform
/// [`ContentType`]: crate::ContentType
/// [`SourceKind`]: crate::SourceKind
/// [`Credibility`]: crate::Credibility
/// [`Severity`]: crate::Severity
/// [`CorrectionStatus`]: crate::CorrectionStatus
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} value: {value:?}")]
pub struct ParseError {
    /// Which enum rejected the token.
    pub kind: &'static str,
    /// The rejected token.
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

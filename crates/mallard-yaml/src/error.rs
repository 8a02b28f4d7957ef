//! Error types for YAML parsing with spans.

use crate::Span;

/// Result type alias for mallard-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a span-tracked YAML tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The scanner rejected the input. The span points at the offending
    /// character.
    #[error("{message}")]
    Scan { message: String, span: Span },

    /// The input contained no YAML document at all.
    #[error("no YAML document found")]
    EmptyStream,
}

impl Error {
    /// The span at which the error was reported, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Scan { span, .. } => Some(*span),
            Error::EmptyStream => None,
        }
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let index = err.marker().index();
        Error::Scan {
            message: err.info().to_string(),
            span: Span::new(index, index + 1),
        }
    }
}

//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input does not reference a post on a recognized domain.
    #[display("invalid post reference: {_0}")]
    InvalidReference(#[error(not(source))] String),
    /// An upstream document could not be decoded at all.
    #[display("malformed document")]
    MalformedDocument,
    /// A candidate media URL is not an absolute http(s) URL.
    #[display("invalid media URL: {_0}")]
    InvalidMediaUrl(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing is pure: the same input always produces the same error.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidReference("not-a-url".to_string()).to_string(), "invalid post reference: not-a-url");
        assert_eq!(ErrorKind::MalformedDocument.to_string(), "malformed document");
        assert!(!ErrorKind::MalformedDocument.is_retryable());
    }
}

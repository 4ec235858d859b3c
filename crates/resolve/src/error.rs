//! Resolution Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. None of these reach callers of
//! [`Resolver`](crate::Resolver): strategies log them and report "not found".

use derive_more::{Display, Error};

/// A resolution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[display("transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The upstream answered with something other than `200 OK`.
    #[display("unexpected status: {_0}")]
    Status(#[error(not(source))] u16),
    /// The response body could not be decoded.
    #[display("could not decode response")]
    Decode,
    /// An endpoint or thumbnail template failed to compile or render.
    #[display("template error: {_0}")]
    Template(#[error(not(source))] String),
    /// The configuration can't be turned into working strategies.
    #[display("invalid resolver configuration")]
    Config,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => *status == 429 || *status >= 500,
            Self::Decode | Self::Template(_) | Self::Config => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Transport("reset".to_string()), true)]
    #[case(ErrorKind::Status(429), true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::Decode, false)]
    #[case(ErrorKind::Template("{{".to_string()), false)]
    fn test_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}

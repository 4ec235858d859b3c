use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use url::Url;

use crate::consts::{SHORTCODE_MIN_LENGTH, SHORTCODE_REGEX};
use crate::error::{Error, ErrorKind};

/// Opaque token naming a single post within the upstream service.
///
/// Always at least ten characters of `[A-Za-z0-9_-]`; construct one through
/// [`FromStr`] or [`ShortcodeParser`](crate::ShortcodeParser).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shortcode(String);
impl Shortcode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_valid(candidate: &str) -> bool {
        candidate.len() >= SHORTCODE_MIN_LENGTH && SHORTCODE_REGEX.is_match(candidate)
    }
}
impl FromStr for Shortcode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            exn::bail!(ErrorKind::InvalidReference(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}
impl AsRef<str> for Shortcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for Shortcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// A successfully parsed input link: the post's [`Shortcode`] plus the
/// normalized absolute URL it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub shortcode: Shortcode,
    pub url: Url,
}

//! Shortcode (post identifier) parsing.
//!
//! Turns the many shapes a post link comes in (with or without scheme,
//! `www.`, usernames, tracking query strings, trailing slashes) into the one
//! [`Shortcode`] that names the post.

use exn::OptionExt;
use tracing::instrument;
use url::Url;

use crate::consts::{BARE_HOST_REGEX, SHORTCODE_MARKERS};
use crate::error::{ErrorKind, Result};
use crate::models::{PostReference, Shortcode};

/// Domains recognized when no explicit list is configured.
pub const DEFAULT_DOMAINS: &[&str] = &["instagram.com", "instagr.am"];

/// Shape-matching rules, most specific first. A capture that fails the
/// validity check falls through to the next rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// The segment right after a marker word: `/reel/{code}`, `/p/{code}`.
    Marker,
    /// The last non-empty path segment: `/{code}/`.
    TrailingSegment,
}
const RULES: &[Rule] = &[Rule::Marker, Rule::TrailingSegment];

impl Rule {
    fn capture<'a>(&self, segments: &[&'a str]) -> Option<&'a str> {
        match self {
            Rule::Marker => segments
                .windows(2)
                .find(|pair| SHORTCODE_MARKERS.iter().any(|marker| pair[0].eq_ignore_ascii_case(marker)))
                .map(|pair| pair[1]),
            Rule::TrailingSegment => segments.last().copied(),
        }
    }
}

/// Extracts [`Shortcode`]s from links on a fixed set of recognized domains.
///
/// Parsing is pure and deterministic: no network access, and the same input
/// always produces the same output.
///
/// # Examples
///
/// ```rust
/// use reelfetch_extract::ShortcodeParser;
///
/// let parser = ShortcodeParser::default();
/// let reference = parser.parse("https://www.instagram.com/reel/ABCDEFGHIJK/?igsh=abc").unwrap();
/// assert_eq!(reference.shortcode.as_str(), "ABCDEFGHIJK");
///
/// assert!(parser.parse("https://example.com/reel/ABCDEFGHIJK/").is_err());
/// assert!(parser.parse("not-a-url").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeParser {
    domains: Vec<String>,
}
impl Default for ShortcodeParser {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAINS.iter().copied())
    }
}
impl ShortcodeParser {
    /// A parser recognizing each of `domains` and all of their subdomains.
    pub fn new<S: AsRef<str>>(domains: impl IntoIterator<Item = S>) -> Self {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    /// Parses a free-form link into a [`PostReference`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidReference`] if the input is not an http(s)
    /// link on a recognized domain, or if no rule captures a valid shortcode.
    #[instrument(level = "debug", skip(self))]
    pub fn parse(&self, input: &str) -> Result<PostReference> {
        let invalid = || ErrorKind::InvalidReference(input.trim().to_string());
        let url = normalize(input).filter(|url| self.recognizes(url)).ok_or_raise(invalid)?;
        let segments: Vec<&str> = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty()).collect();
        let shortcode = RULES
            .iter()
            .filter_map(|rule| rule.capture(&segments))
            .find(|candidate| Shortcode::is_valid(candidate))
            .ok_or_raise(invalid)?;
        Ok(PostReference {
            shortcode: shortcode.parse()?,
            url,
        })
    }

    fn recognizes(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.domains.iter().any(|domain| {
            host == *domain || (host.ends_with(domain.as_str()) && host[..host.len() - domain.len()].ends_with('.'))
        })
    }
}

/// Parses the input as an absolute http(s) URL, assuming `https://` for
/// scheme-less input that starts with a host name.
fn normalize(input: &str) -> Option<Url> {
    let input = input.trim();
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(_) if BARE_HOST_REGEX.is_match(input) => Url::parse(&format!("https://{input}")).ok()?,
        Err(_) => return None,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use exn::ResultExt;
use url::Url;

use crate::consts::MEDIA_EXTENSIONS;
use crate::error::{Error, ErrorKind, Result};

/// An absolute `http`/`https` URL with a host.
///
/// Every successful resolution carries one of these, so a successful result
/// can never point at an empty or relative media location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaUrl(Url);
impl MediaUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim()).or_raise(|| ErrorKind::InvalidMediaUrl(input.to_string()))?;
        Self::try_from(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Case-insensitive check of the path suffix; the query string is ignored.
    pub fn has_extension<S: AsRef<str>>(&self, extensions: &[S]) -> bool {
        let path = self.0.path().to_ascii_lowercase();
        extensions.iter().any(|ext| path.ends_with(&ext.as_ref().to_ascii_lowercase()))
    }

    /// `true` when the host ends with any of the given suffixes.
    pub fn host_matches<S: AsRef<str>>(&self, suffixes: &[S]) -> bool {
        let Some(host) = self.0.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        suffixes.iter().any(|suffix| host.ends_with(&suffix.as_ref().to_ascii_lowercase()))
    }
}
impl TryFrom<Url> for MediaUrl {
    type Error = Error;
    fn try_from(url: Url) -> Result<Self> {
        let has_host = url.host_str().is_some_and(|h| !h.is_empty());
        if !matches!(url.scheme(), "http" | "https") || !has_host {
            exn::bail!(ErrorKind::InvalidMediaUrl(url.to_string()));
        }
        Ok(Self(url))
    }
}
impl FromStr for MediaUrl {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
impl AsRef<str> for MediaUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
impl From<MediaUrl> for String {
    fn from(value: MediaUrl) -> Self {
        value.0.into()
    }
}
impl Display for MediaUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A media URL located inside a structured document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHit {
    pub url: MediaUrl,
    /// Vertical resolution of the selected variant, when the document said.
    pub height: Option<u64>,
}
impl MediaHit {
    pub fn new(url: MediaUrl) -> Self {
        Self { url, height: None }
    }

    /// Quality label derived from the variant height, e.g. `720p`.
    pub fn quality(&self) -> Option<String> {
        self.height.filter(|h| *h > 0).map(|h| format!("{h}p"))
    }
}

/// Acceptance rules for media URLs scraped out of free-form markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    extensions: Vec<String>,
    hosts: Vec<String>,
}
impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            extensions: MEDIA_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            hosts: Vec::new(),
        }
    }
}
impl MediaFilter {
    pub fn with_extensions<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict accepted URLs to hosts ending with one of `hosts`. An empty
    /// list accepts any host.
    pub fn with_hosts<S: Into<String>>(mut self, hosts: impl IntoIterator<Item = S>) -> Self {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn accepts(&self, url: &MediaUrl) -> bool {
        (self.extensions.is_empty() || url.has_extension(self.extensions.as_slice()))
            && (self.hosts.is_empty() || url.host_matches(self.hosts.as_slice()))
    }
}

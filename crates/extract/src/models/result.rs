use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::Extraction;

/// Why a resolution or lookup produced no media.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Failure {
    /// The input is not a link to a post on a recognized domain. Never retried.
    #[display("the link does not reference a recognized post")]
    InvalidReference,
    /// Every configured strategy came back empty-handed.
    #[display("all extraction strategies failed")]
    AllStrategiesExhausted,
    /// A previously valid result has aged out of the cache.
    #[display("the result has expired")]
    Expired,
    /// No result was ever stored under the requested identifier.
    #[display("no such result")]
    NotFound,
}
impl Failure {
    /// Returns `true` if asking again later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllStrategiesExhausted)
    }
}

/// The strategy-agnostic answer handed back to callers.
///
/// When `success` is `true`, `media_url` holds a well-formed absolute URL:
/// successful results can only be built from an [`Extraction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub success: bool,
    /// Opaque identifier for later lookups; assigned when the result is cached.
    #[serde(rename = "video_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "video_url")]
    pub media_url: String,
    pub thumbnail: String,
    pub title: String,
    pub quality: String,
    /// Name of the strategy that produced the media URL.
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}
impl CanonicalResult {
    pub fn found(extraction: Extraction) -> Self {
        Self {
            success: true,
            id: None,
            media_url: extraction.media_url.into(),
            thumbnail: extraction.thumbnail.unwrap_or_default(),
            title: extraction.title.unwrap_or_default(),
            quality: extraction.quality.unwrap_or_default(),
            method: extraction.strategy,
            error: None,
        }
    }

    pub fn failed(failure: Failure) -> Self {
        Self {
            success: false,
            id: None,
            media_url: String::new(),
            thumbnail: String::new(),
            title: String::new(),
            quality: String::new(),
            method: String::new(),
            error: Some(failure),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

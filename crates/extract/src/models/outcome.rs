use super::MediaUrl;

/// What a single strategy found.
///
/// Only the media URL and the strategy name are guaranteed; everything else
/// is filled in by the orchestrator when a strategy can't provide it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub media_url: MediaUrl,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
    /// Human quality label, e.g. `1080p`.
    pub quality: Option<String>,
    /// Name of the strategy that produced this extraction.
    pub strategy: String,
}
impl Extraction {
    pub fn new(media_url: MediaUrl, strategy: impl Into<String>) -> Self {
        Self {
            media_url,
            thumbnail: None,
            title: None,
            quality: None,
            strategy: strategy.into(),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<Option<String>>) -> Self {
        self.thumbnail = thumbnail.into().filter(|t| !t.is_empty());
        self
    }

    pub fn with_title(mut self, title: impl Into<Option<String>>) -> Self {
        self.title = title.into().map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn with_quality(mut self, quality: impl Into<Option<String>>) -> Self {
        self.quality = quality.into().filter(|q| !q.is_empty());
        self
    }
}

/// Result of one strategy attempt. There is no error variant: a strategy
/// that fails for any reason reports [`NotFound`](Outcome::NotFound).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(Extraction),
    NotFound,
}
impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<Extraction> {
        match self {
            Self::Found(extraction) => Some(extraction),
            Self::NotFound => None,
        }
    }
}

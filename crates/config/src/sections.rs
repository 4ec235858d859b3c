use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Lifetimes of cached results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// How long an expired result id keeps reporting "expired" instead of
    /// "not found".
    pub tombstone_secs: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
            tombstone_secs: 30 * 60,
        }
    }
}
impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn tombstone_retention(&self) -> Duration {
        Duration::from_secs(self.tombstone_secs)
    }
}

/// Settings shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Hosts whose links are accepted; subdomains are included.
    pub domains: Vec<String>,
    /// Budget for one strategy, all of its endpoints included.
    pub strategy_timeout_ms: u64,
    /// Budget for a single upstream request.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Pause between two strategies. Zero disables it.
    pub backoff_ms: u64,
    /// Thumbnail URL used when a strategy found none. Template over
    /// `shortcode`, `url`, `path` and `host`.
    pub thumbnail_template: String,
    pub default_title: String,
    pub default_quality: String,
    /// Upstream bodies are read up to this size. Longer pages are scanned
    /// as far as they go; longer JSON fails to decode.
    pub max_document_bytes: usize,
    /// Sent with every request, before strategy-specific headers.
    pub headers: BTreeMap<String, String>,
    /// Pool to pick a `User-Agent` from when none is configured.
    pub user_agents: Vec<String>,
}
impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            domains: vec!["instagram.com".to_string(), "instagr.am".to_string()],
            strategy_timeout_ms: 45_000,
            request_timeout_ms: 15_000,
            connect_timeout_ms: 10_000,
            backoff_ms: 500,
            thumbnail_template: "https://instagram.fdel25-1.fna.fbcdn.net/v/t51.2885-15/{{ shortcode }}_n.jpg"
                .to_string(),
            default_title: "Instagram Reel".to_string(),
            default_quality: "720p".to_string(),
            max_document_bytes: 2 * 1024 * 1024,
            headers: [
                ("Accept", "*/*"),
                ("Accept-Language", "en-US,en;q=0.9"),
                ("Cache-Control", "max-age=0"),
                ("Sec-Fetch-Dest", "document"),
                ("Sec-Fetch-Mode", "navigate"),
                ("Sec-Fetch-Site", "none"),
                ("Sec-Fetch-User", "?1"),
                ("Upgrade-Insecure-Requests", "1"),
            ]
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}
impl ResolverConfig {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; SM-S928B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

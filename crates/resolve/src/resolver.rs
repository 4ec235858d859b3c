use reelfetch_cache::{CacheKey, ResultCache, ResultId};
use reelfetch_config::{CacheConfig, Config};
use reelfetch_extract::ShortcodeParser;
use reelfetch_extract::models::CanonicalResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::Result;
use crate::headers::HeaderSet;
use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::strategy::{self, Toolkit};
use crate::template::Templates;
use crate::transport::{HttpTransport, TransportHandle};

/// The cached front door: resolves post links, and looks previous results
/// up by id.
///
/// Cloning is cheap; clones share the strategies and the cache.
#[derive(Clone)]
pub struct Resolver {
    orchestrator: Arc<Orchestrator>,
    cache: ResultCache,
    ttl: Duration,
    sweep_interval: Duration,
}

impl Resolver {
    pub fn new(orchestrator: Orchestrator, config: &CacheConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            cache: ResultCache::new(config.tombstone_retention()),
            ttl: config.ttl(),
            sweep_interval: config.sweep_interval(),
        }
    }

    /// Builds the strategies from `config`, talking to upstreams over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.resolver)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// As [`from_config`](Self::from_config), over any [`Transport`](crate::transport::Transport).
    pub fn with_transport(config: &Config, transport: TransportHandle) -> Result<Self> {
        let toolkit = Toolkit {
            transport,
            templates: Arc::new(Templates::default()),
            headers: Arc::new(HeaderSet::new(&config.resolver.headers, &config.resolver.user_agents)),
            max_document_bytes: config.resolver.max_document_bytes,
        };
        let strategies = config
            .strategies
            .iter()
            .map(|strategy| strategy::build(strategy, &toolkit))
            .collect::<Result<Vec<_>>>()?;
        let orchestrator = Orchestrator::new(
            ShortcodeParser::new(&config.resolver.domains),
            strategies,
            OrchestratorOptions::from(&config.resolver),
            toolkit.templates.clone(),
        )?;
        tracing::debug!(strategies = ?orchestrator.strategy_names().collect::<Vec<_>>(), "Resolver ready");
        Ok(Self::new(orchestrator, &config.cache))
    }

    /// Resolves a post link, serving a cached result while it is fresh.
    ///
    /// Concurrent calls for the same link share one resolution.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, url: &str) -> CanonicalResult {
        let key = CacheKey::for_url(url);
        self.cache
            .get_or_resolve(key, self.ttl, || self.orchestrator.extract(url))
            .await
    }

    /// A previously resolved result, or a failure saying whether it expired
    /// or never existed.
    pub async fn lookup(&self, id: &str) -> CanonicalResult {
        self.cache.lookup(&ResultId::from(id)).await.into()
    }

    /// Periodically evicts expired results until the handle is aborted.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        self.cache.spawn_sweeper(self.sweep_interval)
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use reelfetch_config::{MarkupConfig, StrategyConfig};
    use reelfetch_extract::models::Failure;

    const LINK: &str = "https://www.instagram.com/reel/ABCDEFGHIJ/";
    const PAGE: &str = "https://mirror.example/reel/ABCDEFGHIJ/";

    fn config() -> Config {
        let mut config = Config::default();
        config.resolver.backoff_ms = 0;
        config.strategies = vec![StrategyConfig::Markup(MarkupConfig {
            name: "mirror".to_string(),
            endpoints: vec!["https://mirror.example{{ path }}".to_string()],
            headers: Default::default(),
            quality: None,
            hosts: Vec::new(),
            extensions: Vec::new(),
        })];
        config
    }

    fn resolver(transport: MockTransport) -> (Resolver, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let resolver = Resolver::with_transport(&config(), transport.clone()).unwrap();
        (resolver, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_caches_success() {
        let (resolver, transport) =
            resolver(MockTransport::default().with_response(PAGE, 200, r#"<video src="/v/ABCDEFGHIJ.mp4"></video>"#));
        let first = resolver.resolve(LINK).await;
        let second = resolver.resolve(&format!("  {LINK}  ")).await;
        assert!(first.success);
        assert_eq!(first, second);
        assert_eq!(transport.requests().await.len(), 1);
        let id = first.id.clone().unwrap();
        assert_eq!(resolver.lookup(&id).await, first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_after_expiry() {
        let (resolver, _) =
            resolver(MockTransport::default().with_response(PAGE, 200, r#"<video src="/v/ABCDEFGHIJ.mp4"></video>"#));
        let id = resolver.resolve(LINK).await.id.unwrap();
        tokio::time::advance(Duration::from_secs(1801)).await;
        assert_eq!(resolver.lookup(&id).await.error, Some(Failure::Expired));
        assert_eq!(resolver.lookup("000000000000").await.error, Some(Failure::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_retried() {
        let (resolver, transport) = resolver(MockTransport::default());
        assert_eq!(resolver.resolve(LINK).await.error, Some(Failure::AllStrategiesExhausted));
        assert_eq!(resolver.resolve(LINK).await.error, Some(Failure::AllStrategiesExhausted));
        assert_eq!(transport.requests().await.len(), 2);
    }

    #[test]
    fn test_broken_template_fails_early() {
        let mut config = config();
        config.resolver.thumbnail_template = "{{ shortcode".to_string();
        let result = Resolver::with_transport(&config, Arc::new(MockTransport::default()));
        assert!(result.is_err());
    }
}

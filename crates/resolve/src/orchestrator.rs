use reelfetch_config::ResolverConfig;
use reelfetch_extract::ShortcodeParser;
use reelfetch_extract::models::{CanonicalResult, Extraction, Failure, Outcome, PostReference};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::instrument;

use crate::error::Result;
use crate::strategy::{StrategyHandle, Target};
use crate::template::{self, EndpointTemplate, Templates};

/// How strategies are paced, and how gaps in their findings are filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Budget for each strategy. Elapsing cancels the attempt.
    pub strategy_timeout: Duration,
    /// Pause between strategies; never applied after the last one.
    pub backoff: Duration,
    pub thumbnail_template: String,
    pub default_title: String,
    pub default_quality: String,
}
impl From<&ResolverConfig> for OrchestratorOptions {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            strategy_timeout: config.strategy_timeout(),
            backoff: config.backoff(),
            thumbnail_template: config.thumbnail_template.clone(),
            default_title: config.default_title.clone(),
            default_quality: config.default_quality.clone(),
        }
    }
}
impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

/// Runs strategies one after another until one finds the media.
///
/// Strictly sequential: a strategy only starts once the previous one came
/// back empty-handed or ran out of time.
pub struct Orchestrator {
    parser: ShortcodeParser,
    strategies: Vec<StrategyHandle>,
    options: OrchestratorOptions,
    templates: Arc<Templates>,
    thumbnail: EndpointTemplate,
}

impl Orchestrator {
    pub fn new(
        parser: ShortcodeParser,
        strategies: Vec<StrategyHandle>,
        options: OrchestratorOptions,
        templates: Arc<Templates>,
    ) -> Result<Self> {
        let thumbnail = templates.compile(&options.thumbnail_template)?;
        Ok(Self {
            parser,
            strategies,
            options,
            templates,
            thumbnail,
        })
    }

    /// Names of the configured strategies, in the order they are tried.
    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|strategy| strategy.name())
    }

    #[instrument(skip(self, url), fields(url = url.trim()))]
    pub async fn extract(&self, url: &str) -> CanonicalResult {
        let reference = match self.parser.parse(url) {
            Ok(reference) => reference,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected input that is not a post link");
                return CanonicalResult::failed(Failure::InvalidReference);
            },
        };

        for (index, strategy) in self.strategies.iter().enumerate() {
            let deadline = Instant::now() + self.options.strategy_timeout;
            let target = Target::new(reference.clone(), deadline);
            match timeout_at(deadline, strategy.attempt(&target)).await {
                Ok(Outcome::Found(extraction)) => {
                    tracing::info!(strategy = strategy.name(), shortcode = %reference.shortcode, "Media found");
                    return self.finish(extraction, &reference);
                },
                Ok(Outcome::NotFound) => tracing::debug!(strategy = strategy.name(), "Strategy found nothing"),
                Err(_) => tracing::warn!(
                    strategy = strategy.name(),
                    timeout_ms = self.options.strategy_timeout.as_millis() as u64,
                    "Strategy timed out"
                ),
            }
            let is_last = index + 1 == self.strategies.len();
            if !is_last && !self.options.backoff.is_zero() {
                tokio::time::sleep(self.options.backoff).await;
            }
        }

        tracing::warn!(shortcode = %reference.shortcode, strategies = self.strategies.len(), "All strategies exhausted");
        CanonicalResult::failed(Failure::AllStrategiesExhausted)
    }

    fn finish(&self, extraction: Extraction, reference: &PostReference) -> CanonicalResult {
        let thumbnail = extraction.thumbnail.clone().or_else(|| {
            let context = template::context(reference);
            self.templates
                .render(&self.thumbnail, &context)
                .inspect_err(|err| tracing::warn!(error = %err, "Could not render fallback thumbnail"))
                .ok()
        });
        let title = extraction
            .title
            .clone()
            .unwrap_or_else(|| format!("{} • {}", self.options.default_title, extraction.strategy));
        let quality = extraction.quality.clone().unwrap_or_else(|| self.options.default_quality.clone());
        CanonicalResult::found(
            extraction
                .with_thumbnail(thumbnail)
                .with_title(title)
                .with_quality(quality),
        )
    }
}

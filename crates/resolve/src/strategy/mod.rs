//! Extraction strategies.
//!
//! A [`Strategy`] is one independent way of turning a post into a media URL.
//! Strategies never fail loudly: whatever goes wrong inside one is logged
//! and reported as [`Outcome::NotFound`], leaving the decision of what to
//! try next to the [`Orchestrator`](crate::Orchestrator).

mod json_api;
mod markup;
mod service;

pub use self::json_api::JsonApiStrategy;
pub use self::markup::MarkupStrategy;
pub use self::service::ServiceStrategy;
use crate::error::{ErrorKind, Result};
use crate::headers::HeaderSet;
use crate::template::Templates;
use crate::transport::{Request, TransportHandle};
use async_trait::async_trait;
use reelfetch_config::StrategyConfig;
use reelfetch_extract::models::{Extraction, Outcome, PostReference};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Upper bound on endpoint variants a single strategy tries per attempt.
pub const MAX_ENDPOINT_ATTEMPTS: usize = 8;

pub type StrategyHandle = Arc<dyn Strategy + Send + Sync>;

/// What a strategy is asked to resolve, and by when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub reference: PostReference,
    /// Strategies stop starting new requests once this passes.
    pub deadline: Instant,
}
impl Target {
    pub fn new(reference: PostReference, deadline: Instant) -> Self {
        Self { reference, deadline }
    }

    pub fn is_past_deadline(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

#[async_trait]
pub trait Strategy: Send + Sync {
    /// Reported as the `method` of results this strategy produces.
    fn name(&self) -> &str;

    async fn attempt(&self, target: &Target) -> Outcome;
}

/// Everything the built-in strategies share.
#[derive(Clone)]
pub struct Toolkit {
    pub transport: TransportHandle,
    pub templates: Arc<Templates>,
    pub headers: Arc<HeaderSet>,
    /// Rendered pages are truncated to this size before scanning.
    pub max_document_bytes: usize,
}
impl Toolkit {
    /// Sends `request` and returns the body of a `200 OK` response, cut to
    /// at most `max_document_bytes`.
    pub(crate) async fn fetch(&self, request: Request) -> Result<Vec<u8>> {
        tracing::trace!(transport = self.transport.name(), method = %request.method, url = %request.url, "Sending request");
        let response = self.transport.send(request).await?;
        if !response.is_ok() {
            exn::bail!(ErrorKind::Status(response.status));
        }
        let mut body = response.body;
        body.truncate(self.max_document_bytes);
        Ok(body)
    }
}

/// Builds the strategy described by `config`. Templates are compiled here,
/// so a broken endpoint fails at startup rather than on first use.
pub fn build(config: &StrategyConfig, toolkit: &Toolkit) -> Result<StrategyHandle> {
    let strategy: StrategyHandle = match config {
        StrategyConfig::JsonApi(config) => Arc::new(JsonApiStrategy::new(config, toolkit.clone())?),
        StrategyConfig::Markup(config) => Arc::new(MarkupStrategy::new(config, toolkit.clone())?),
        StrategyConfig::Service(config) => Arc::new(ServiceStrategy::new(config, toolkit.clone())?),
    };
    Ok(strategy)
}

/// Tries `endpoints` in order until one yields an extraction, the attempt
/// cap is reached, or the deadline passes.
async fn first_found<'a, E, F, Fut>(strategy: &str, target: &Target, endpoints: &'a [E], attempt: F) -> Outcome
where
    F: Fn(&'a E) -> Fut,
    Fut: Future<Output = Result<Option<Extraction>>>,
{
    for (index, endpoint) in endpoints.iter().take(MAX_ENDPOINT_ATTEMPTS).enumerate() {
        if target.is_past_deadline() {
            tracing::debug!(strategy, remaining = endpoints.len() - index, "Deadline passed; skipping endpoints");
            break;
        }
        match attempt(endpoint).await {
            Ok(Some(extraction)) => return Outcome::Found(extraction),
            Ok(None) => tracing::debug!(strategy, endpoint = index, "No media in response"),
            Err(err) => tracing::debug!(strategy, endpoint = index, error = %err, "Endpoint failed"),
        }
    }
    Outcome::NotFound
}

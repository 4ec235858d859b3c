use async_trait::async_trait;
use reelfetch_config::{Headers, MarkupConfig};
use reelfetch_extract::markup;
use reelfetch_extract::models::{Extraction, MediaFilter, Outcome};
use tracing::instrument;
use upon::Value;

use super::{Strategy, Target, Toolkit, first_found};
use crate::error::Result;
use crate::template::{self, EndpointTemplate};
use crate::transport::Request;

/// Fetches rendered pages (embeds, mirrors) and scans them for media tags.
pub struct MarkupStrategy {
    name: String,
    endpoints: Vec<EndpointTemplate>,
    headers: Headers,
    quality: Option<String>,
    filter: MediaFilter,
    toolkit: Toolkit,
}

impl MarkupStrategy {
    pub fn new(config: &MarkupConfig, toolkit: Toolkit) -> Result<Self> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|endpoint| toolkit.templates.compile(endpoint))
            .collect::<Result<_>>()?;
        let mut filter = MediaFilter::default().with_hosts(config.hosts.iter().cloned());
        if !config.extensions.is_empty() {
            filter = filter.with_extensions(config.extensions.iter().cloned());
        }
        Ok(Self {
            name: config.name.clone(),
            endpoints,
            headers: config.headers.clone(),
            quality: config.quality.clone(),
            filter,
            toolkit,
        })
    }

    async fn try_endpoint(
        &self,
        endpoint: &EndpointTemplate,
        target: &Target,
        context: &Value,
    ) -> Result<Option<Extraction>> {
        let url = self.toolkit.templates.render_url(endpoint, context)?;
        let headers = self.toolkit.headers.for_request(&self.headers, &target.reference.shortcode);
        let body = self.toolkit.fetch(Request::get(url.clone()).with_headers(headers)).await?;
        let hit = markup::scan(&body, &url, &self.filter, Some(self.toolkit.max_document_bytes));
        Ok(hit.map(|hit| {
            Extraction::new(hit.url, &self.name)
                .with_thumbnail(hit.thumbnail)
                .with_title(hit.title)
                .with_quality(self.quality.clone())
        }))
    }
}

#[async_trait]
impl Strategy for MarkupStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip_all, fields(strategy = %self.name, shortcode = %target.reference.shortcode))]
    async fn attempt(&self, target: &Target) -> Outcome {
        let context = template::context(&target.reference);
        first_found(&self.name, target, &self.endpoints, |endpoint| {
            self.try_endpoint(endpoint, target, &context)
        })
        .await
    }
}

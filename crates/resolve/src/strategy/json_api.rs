use async_trait::async_trait;
use exn::ResultExt;
use reelfetch_config::{Headers, JsonApiConfig};
use reelfetch_extract::locate_bytes;
use reelfetch_extract::models::{Extraction, Outcome};
use tracing::instrument;
use upon::Value;

use super::{Strategy, Target, Toolkit, first_found};
use crate::error::{ErrorKind, Result};
use crate::template::{self, EndpointTemplate};
use crate::transport::Request;

/// Queries structured endpoints and searches the decoded document for a
/// media URL, whatever its shape.
pub struct JsonApiStrategy {
    name: String,
    endpoints: Vec<EndpointTemplate>,
    headers: Headers,
    quality: Option<String>,
    toolkit: Toolkit,
}

impl JsonApiStrategy {
    pub fn new(config: &JsonApiConfig, toolkit: Toolkit) -> Result<Self> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|endpoint| toolkit.templates.compile(endpoint))
            .collect::<Result<_>>()?;
        Ok(Self {
            name: config.name.clone(),
            endpoints,
            headers: config.headers.clone(),
            quality: config.quality.clone(),
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
        let body = self.toolkit.fetch(Request::get(url).with_headers(headers)).await?;
        let Some(hit) = locate_bytes(&body).or_raise(|| ErrorKind::Decode)? else {
            return Ok(None);
        };
        // A height in the document beats the configured guess.
        let quality = hit.quality().or_else(|| self.quality.clone());
        Ok(Some(Extraction::new(hit.url, &self.name).with_quality(quality)))
    }
}

#[async_trait]
impl Strategy for JsonApiStrategy {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderSet;
    use crate::template::Templates;
    use crate::transport::MockTransport;
    use reelfetch_extract::ShortcodeParser;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const LINK: &str = "https://www.instagram.com/reel/ABCDEFGHIJ/";

    fn strategy(transport: Arc<MockTransport>, endpoints: &[&str]) -> JsonApiStrategy {
        let config = JsonApiConfig {
            name: "mobile_api".to_string(),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            headers: [("X-IG-App-ID".to_string(), "124".to_string())].into_iter().collect(),
            quality: Some("1080p".to_string()),
        };
        let toolkit = Toolkit {
            transport,
            templates: Arc::new(Templates::default()),
            headers: Arc::new(HeaderSet::default()),
            max_document_bytes: 1024,
        };
        JsonApiStrategy::new(&config, toolkit).unwrap()
    }

    fn target() -> Target {
        let reference = ShortcodeParser::default().parse(LINK).unwrap();
        Target::new(reference, Instant::now() + Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_found_with_height() {
        let body = r#"{"items": [{"video_versions": [
            {"url": "https://cdn.example/low.mp4", "height": 480},
            {"url": "https://cdn.example/high.mp4", "height": 1280}
        ]}]}"#;
        let transport = Arc::new(
            MockTransport::default().with_response("https://api.example/media/ABCDEFGHIJ/info/", 200, body),
        );
        let strategy = strategy(transport.clone(), &["https://api.example/media/{{ shortcode }}/info/"]);
        let extraction = strategy.attempt(&target()).await.found().unwrap();
        assert_eq!(extraction.media_url.as_str(), "https://cdn.example/high.mp4");
        assert_eq!(extraction.quality.as_deref(), Some("1280p"));
        assert_eq!(extraction.strategy, "mobile_api");
        let requests = transport.requests().await;
        assert_eq!(requests[0].header("x-ig-app-id"), Some("124"));
    }

    #[tokio::test]
    async fn test_configured_quality_without_height() {
        let body = r#"{"data": {"video_url": "https://cdn.example/v.mp4"}}"#;
        let transport = Arc::new(MockTransport::default().with_response("https://api.example/b", 200, body));
        let strategy = strategy(transport, &["https://api.example/a", "https://api.example/b"]);
        let extraction = strategy.attempt(&target()).await.found().unwrap();
        assert_eq!(extraction.quality.as_deref(), Some("1080p"));
    }

    #[tokio::test]
    async fn test_failures_become_not_found() {
        let transport = Arc::new(
            MockTransport::default()
                .with_response("https://api.example/html", 200, "<html>login</html>")
                .with_response("https://api.example/empty", 200, r#"{"items": []}"#)
                .with_response("https://api.example/limited", 429, "{}")
                .with_failure("https://api.example/down", "connection reset"),
        );
        let strategy = strategy(
            transport.clone(),
            &[
                "https://api.example/html",
                "https://api.example/empty",
                "https://api.example/limited",
                "https://api.example/down",
            ],
        );
        assert_eq!(strategy.attempt(&target()).await, Outcome::NotFound);
        assert_eq!(transport.requests().await.len(), 4);
    }

    #[tokio::test]
    async fn test_oversized_document_is_rejected() {
        let padding = "x".repeat(2048);
        let body = format!(r#"{{"padding": "{padding}", "video_url": "https://cdn.example/v.mp4"}}"#);
        let transport = Arc::new(MockTransport::default().with_response("https://api.example/big", 200, body));
        let strategy = strategy(transport, &["https://api.example/big"]);
        assert_eq!(strategy.attempt(&target()).await, Outcome::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_endpoints_stop_at_deadline() {
        let transport = Arc::new(MockTransport::default().with_delay(Duration::from_secs(2)));
        let strategy = strategy(
            transport.clone(),
            &["https://api.example/a", "https://api.example/b", "https://api.example/c"],
        );
        let reference = ShortcodeParser::default().parse(LINK).unwrap();
        let target = Target::new(reference, Instant::now() + Duration::from_secs(3));
        assert_eq!(strategy.attempt(&target).await, Outcome::NotFound);
        // The third endpoint would start after the deadline.
        assert_eq!(transport.requests().await.len(), 2);
    }
}

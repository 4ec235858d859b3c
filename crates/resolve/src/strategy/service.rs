use async_trait::async_trait;
use exn::ResultExt;
use reelfetch_config::{Headers, ServiceConfig, ServiceEndpoint, ServiceMethod};
use reelfetch_extract::markup::unescape;
use reelfetch_extract::models::{Extraction, MediaUrl, Outcome};
use tracing::instrument;
use upon::Value;

use super::{Strategy, Target, Toolkit, first_found};
use crate::error::{ErrorKind, Result};
use crate::template::{self, EndpointTemplate, Templates};
use crate::transport::Request;

struct Endpoint {
    /// Reported as the result's `method`.
    label: String,
    url: EndpointTemplate,
    method: ServiceMethod,
    params: Vec<(String, EndpointTemplate)>,
    pointers: Vec<String>,
}
impl Endpoint {
    fn new(strategy: &str, config: &ServiceEndpoint, templates: &Templates) -> Result<Self> {
        if let Some(pointer) = config.pointers.iter().find(|p| !p.is_empty() && !p.starts_with('/')) {
            tracing::warn!(strategy, pointer = %pointer, "JSON pointers must be empty or start with '/'");
            exn::bail!(ErrorKind::Config);
        }
        let params = config
            .params
            .iter()
            .map(|(name, value)| -> Result<_> { Ok((name.clone(), templates.compile(value)?)) })
            .collect::<Result<_>>()?;
        Ok(Self {
            label: match &config.name {
                Some(name) => format!("{strategy}_{name}"),
                None => strategy.to_string(),
            },
            url: templates.compile(&config.url)?,
            method: config.method,
            params,
            pointers: config.pointers.clone(),
        })
    }
}

/// Asks third-party resolution services, reading the media URL out of their
/// JSON answer with a list of JSON pointers.
pub struct ServiceStrategy {
    name: String,
    endpoints: Vec<Endpoint>,
    headers: Headers,
    quality: Option<String>,
    toolkit: Toolkit,
}

impl ServiceStrategy {
    pub fn new(config: &ServiceConfig, toolkit: Toolkit) -> Result<Self> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|endpoint| Endpoint::new(&config.name, endpoint, &toolkit.templates))
            .collect::<Result<_>>()?;
        Ok(Self {
            name: config.name.clone(),
            endpoints,
            headers: config.headers.clone(),
            quality: config.quality.clone(),
            toolkit,
        })
    }

    async fn try_endpoint(&self, endpoint: &Endpoint, target: &Target, context: &Value) -> Result<Option<Extraction>> {
        let templates = &self.toolkit.templates;
        let mut url = templates.render_url(&endpoint.url, context)?;
        let params = endpoint
            .params
            .iter()
            .map(|(name, value)| -> Result<_> { Ok((name.clone(), templates.render(value, context)?)) })
            .collect::<Result<Vec<_>>>()?;
        let request = match endpoint.method {
            ServiceMethod::Get => {
                if !params.is_empty() {
                    url.query_pairs_mut().extend_pairs(&params);
                }
                Request::get(url)
            },
            ServiceMethod::Post => Request::post_form(url, params),
        };
        let headers = self.toolkit.headers.for_request(&self.headers, &target.reference.shortcode);
        let body = self.toolkit.fetch(request.with_headers(headers)).await?;
        let document: serde_json::Value = serde_json::from_slice(&body).or_raise(|| ErrorKind::Decode)?;
        let media = endpoint
            .pointers
            .iter()
            .filter_map(|pointer| document.pointer(pointer))
            .filter_map(serde_json::Value::as_str)
            .find_map(|candidate| MediaUrl::parse(&unescape(candidate)).ok());
        Ok(media.map(|url| Extraction::new(url, &endpoint.label).with_quality(self.quality.clone())))
    }
}

#[async_trait]
impl Strategy for ServiceStrategy {
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
    use crate::transport::{Method, MockTransport};
    use reelfetch_extract::ShortcodeParser;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const LINK: &str = "https://www.instagram.com/reel/ABCDEFGHIJ/";

    fn endpoint(name: &str, url: &str, method: ServiceMethod, pointers: &[&str]) -> ServiceEndpoint {
        ServiceEndpoint {
            name: Some(name.to_string()),
            url: url.to_string(),
            method,
            params: [("url".to_string(), "{{ url }}".to_string())].into_iter().collect(),
            pointers: pointers.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn strategy(transport: Arc<MockTransport>, endpoints: Vec<ServiceEndpoint>) -> Result<ServiceStrategy> {
        let config = ServiceConfig {
            name: "external".to_string(),
            endpoints,
            headers: Headers::new(),
            quality: Some("720p".to_string()),
        };
        let toolkit = Toolkit {
            transport,
            templates: Arc::new(Templates::default()),
            headers: Arc::new(HeaderSet::default()),
            max_document_bytes: 1024,
        };
        ServiceStrategy::new(&config, toolkit)
    }

    fn target() -> Target {
        let reference = ShortcodeParser::default().parse(LINK).unwrap();
        Target::new(reference, Instant::now() + Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_get_with_query_parameters() {
        let transport = Arc::new(MockTransport::default().with_response(
            "https://save.example/api?url=https%3A%2F%2Fwww.instagram.com%2Freel%2FABCDEFGHIJ%2F",
            200,
            r#"{"data": [{"url": "https:\/\/cdn.example\/v.mp4"}]}"#,
        ));
        let endpoints = vec![endpoint("savefrom", "https://save.example/api", ServiceMethod::Get, &["/url", "/data/0/url"])];
        let strategy = strategy(transport, endpoints).unwrap();
        let extraction = strategy.attempt(&target()).await.found().unwrap();
        assert_eq!(extraction.media_url.as_str(), "https://cdn.example/v.mp4");
        assert_eq!(extraction.strategy, "external_savefrom");
        assert_eq!(extraction.quality.as_deref(), Some("720p"));
    }

    #[tokio::test]
    async fn test_post_form() {
        let transport = Arc::new(MockTransport::default().with_response(
            "https://snap.example/api",
            200,
            r#"{"status": "ok", "data": {"url": "https://cdn.example/s.mp4"}}"#,
        ));
        let endpoints = vec![endpoint("snap", "https://snap.example/api", ServiceMethod::Post, &["/url", "/data/url"])];
        let strategy = strategy(transport.clone(), endpoints).unwrap();
        assert!(strategy.attempt(&target()).await.is_found());
        let requests = transport.requests().await;
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.form.as_deref(), Some(&[("url".to_string(), LINK.to_string())][..]));
    }

    #[tokio::test]
    async fn test_unusable_answers() {
        let transport = Arc::new(
            MockTransport::default()
                .with_response("https://a.example/api", 200, r#"{"url": "not a url"}"#)
                .with_response("https://b.example/api", 200, r#"{"error": "rate limited"}"#),
        );
        let endpoints = vec![
            endpoint("a", "https://a.example/api", ServiceMethod::Post, &["/url"]),
            endpoint("b", "https://b.example/api", ServiceMethod::Post, &["/url"]),
        ];
        let strategy = strategy(transport, endpoints).unwrap();
        assert_eq!(strategy.attempt(&target()).await, Outcome::NotFound);
    }

    #[test]
    fn test_rejects_malformed_pointer() {
        let endpoints = vec![endpoint("a", "https://a.example/api", ServiceMethod::Get, &["url"])];
        let err = strategy(Arc::new(MockTransport::default()), endpoints).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Config));
    }
}

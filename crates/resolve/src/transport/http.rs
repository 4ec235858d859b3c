use async_trait::async_trait;
use exn::ResultExt;
use reelfetch_config::ResolverConfig;
use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::instrument;

use super::{Method, Request, Response, Transport};
use crate::error::{ErrorKind, Result};

const MAX_REDIRECTS: usize = 10;

/// [`Transport`] backed by a shared [`reqwest::Client`].
///
/// Cookies set by one upstream response are replayed on later requests to
/// the same host, which some endpoints insist on.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    /// Bodies are read up to this many bytes; the rest is never downloaded.
    max_body_bytes: usize,
}

impl HttpTransport {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .or_raise(|| ErrorKind::Config)?;
        Ok(Self {
            client,
            max_body_bytes: config.max_document_bytes,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(level = "trace", skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: Request) -> Result<Response> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        let mut response = builder
            .send()
            .await
            .map_err(|err| ErrorKind::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| ErrorKind::Transport(err.to_string()))?
        {
            let remaining = self.max_body_bytes - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                tracing::debug!(limit = self.max_body_bytes, "Response body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Response { status, body })
    }
}

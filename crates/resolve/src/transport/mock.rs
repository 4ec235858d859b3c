//! In-memory transport for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{Request, Response, Transport};
use crate::error::{ErrorKind, Result};

#[derive(Debug, Clone)]
enum Route {
    Respond(Response),
    Fail(String),
}

/// In-memory transport for testing.
///
/// Responses are keyed by the exact request URL (query string included).
/// Unknown URLs answer `404`. Every request is recorded, in order, so tests
/// can assert on what was (and wasn't) sent.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: HashMap<String, Route>,
    delay: Option<Duration>,
    requests: RwLock<Vec<Request>>,
}

impl MockTransport {
    pub fn with_response(mut self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let response = Response {
            status,
            body: body.into(),
        };
        self.routes.insert(url.into(), Route::Respond(response));
        self
    }

    /// Requests to `url` fail without a response.
    pub fn with_failure(mut self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Route::Fail(reason.into()));
        self
    }

    /// Every request waits `delay` before it is answered.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let route = self.routes.get(request.url.as_str()).cloned();
        self.requests.write().await.push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(reason)) => Err(ErrorKind::Transport(reason).into()),
            None => Ok(Response {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request {
        Request::get(url.parse().unwrap())
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let transport = MockTransport::default();
        let response = transport.send(request("https://api.example/missing")).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
    }

    #[tokio::test]
    async fn test_failure_route() {
        let transport = MockTransport::default().with_failure("https://api.example/down", "connection reset");
        let err = transport.send(request("https://api.example/down")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Transport(_)));
    }

    #[tokio::test]
    async fn test_records_requests_in_order() {
        let transport = MockTransport::default().with_response("https://api.example/a", 200, "a");
        transport.send(request("https://api.example/a")).await.unwrap();
        transport.send(request("https://api.example/b")).await.unwrap();
        let urls: Vec<_> = transport.requests().await.into_iter().map(|r| r.url.to_string()).collect();
        assert_eq!(urls, ["https://api.example/a", "https://api.example/b"]);
    }
}

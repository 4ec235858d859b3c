//! Transport trait and implementations.
//!
//! Strategies never talk to the network directly: they build a [`Request`]
//! and hand it to a [`Transport`]. Production code uses [`HttpTransport`];
//! tests swap in an in-memory implementation.

mod http;
#[cfg(test)]
mod mock;

pub use self::http::HttpTransport;
#[cfg(test)]
pub use self::mock::MockTransport;
use crate::error::Result;
use async_trait::async_trait;
use derive_more::Display;
use std::sync::Arc;
use url::Url;

pub type TransportHandle = Arc<dyn Transport + Send + Sync>;

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    #[display("GET")]
    Get,
    #[display("POST")]
    Post,
}

/// A fully rendered upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    /// Sent in order; names are compared case-insensitively upstream.
    pub headers: Vec<(String, String)>,
    /// Form fields, sent as `application/x-www-form-urlencoded`.
    pub form: Option<Vec<(String, String)>>,
}
impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url,
            headers: Vec::new(),
            form: Some(form),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}
impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Sends upstream requests on behalf of strategies.
///
/// A non-success status is not an error at this layer: it comes back as a
/// [`Response`] and the strategy decides what to make of it. Errors are
/// reserved for requests that never got an answer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Used for logging only.
    fn name(&self) -> &str;

    async fn send(&self, request: Request) -> Result<Response>;
}

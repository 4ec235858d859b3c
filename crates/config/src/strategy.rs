//! Strategy definitions.
//!
//! Every strategy is plain data: which endpoints to try, which headers to
//! send, and how to read the response. Endpoint URLs and parameter values
//! are templates over `shortcode`, `url`, `path` and `host`, with a
//! `urlencode` formatter available (`{{ url | urlencode }}`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Structured (JSON) endpoints, searched for a media URL.
    JsonApi(JsonApiConfig),
    /// Rendered pages, scanned for media tags.
    Markup(MarkupConfig),
    /// Third-party resolution services with a known response layout.
    Service(ServiceConfig),
}
impl StrategyConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::JsonApi(config) => &config.name,
            Self::Markup(config) => &config.name,
            Self::Service(config) => &config.name,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        match self {
            Self::JsonApi(config) => config.endpoints.len(),
            Self::Markup(config) => config.endpoints.len(),
            Self::Service(config) => config.endpoints.len(),
        }
    }

    /// The default strategy list, in the order they are tried.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::JsonApi(JsonApiConfig {
                name: "graphql".to_string(),
                endpoints: [
                    "2b0673e0dc4580674a88d426fe00ea90",
                    "9f8827793ef34641b2fb195d4d41151c",
                    "b3055c01b4b222b8a47dc12b090e4e64",
                    "55a3c4bad29e4e20c20ff4cdfd80f5b4",
                    "477b65a610446940213fa29830720bcd",
                ]
                .iter()
                .map(|hash| {
                    format!(
                        "https://www.instagram.com/graphql/query/?query_hash={hash}&variables=%7B%22shortcode%22%3A%22{{{{ shortcode }}}}%22%7D"
                    )
                })
                .collect(),
                headers: pairs(&[("x-ig-app-id", "936619743392459"), ("x-requested-with", "XMLHttpRequest")]),
                quality: Some("1080p".to_string()),
            }),
            Self::JsonApi(JsonApiConfig {
                name: "mobile_api".to_string(),
                endpoints: strings(&[
                    "https://i.instagram.com/api/v1/media/{{ shortcode }}/info/",
                    "https://www.instagram.com/api/v1/media/{{ shortcode }}/info/",
                    "https://instagram.com/api/v1/media/{{ shortcode }}/info/",
                ]),
                headers: pairs(&[
                    (
                        "User-Agent",
                        "Instagram 269.0.0.18.75 (iPhone13,2; iOS 15_4_1; en_US; en-US; scale=3.00; 1170x2532; 386397794)",
                    ),
                    ("Accept", "*/*"),
                    ("Accept-Language", "en-US"),
                    ("X-IG-App-ID", "124024574287414"),
                ]),
                quality: Some("1080p".to_string()),
            }),
            Self::JsonApi(JsonApiConfig {
                name: "json_endpoint".to_string(),
                endpoints: strings(&[
                    "https://www.instagram.com/p/{{ shortcode }}/?__a=1&__d=dis",
                    "https://www.instagram.com/p/{{ shortcode }}/?__a=1",
                    "https://i.instagram.com/p/{{ shortcode }}/?__a=1",
                ]),
                headers: Headers::new(),
                quality: Some("1080p".to_string()),
            }),
            Self::Markup(MarkupConfig {
                name: "embed_page".to_string(),
                endpoints: strings(&[
                    "https://www.instagram.com/p/{{ shortcode }}/embed/captioned/",
                    "https://www.instagram.com/reel/{{ shortcode }}/embed/",
                ]),
                headers: Headers::new(),
                quality: Some("720p".to_string()),
                hosts: strings(&["instagram.com", "fbcdn.net"]),
                extensions: Vec::new(),
            }),
            Self::Markup(MarkupConfig {
                name: "ddinsta".to_string(),
                endpoints: strings(&["https://ddinstagram.com{{ path }}"]),
                headers: Headers::new(),
                quality: Some("480p".to_string()),
                hosts: Vec::new(),
                extensions: Vec::new(),
            }),
            Self::Markup(MarkupConfig {
                name: "oembed_api".to_string(),
                endpoints: strings(&["https://www.instagram.com/p/{{ shortcode }}/embed/"]),
                headers: Headers::new(),
                quality: Some("720p".to_string()),
                hosts: Vec::new(),
                extensions: Vec::new(),
            }),
            Self::Service(ServiceConfig {
                name: "external".to_string(),
                endpoints: vec![
                    ServiceEndpoint {
                        name: Some("snapinsta".to_string()),
                        url: "https://snapinsta.to/api/ajaxSearch".to_string(),
                        method: ServiceMethod::Post,
                        params: pairs(&[("q", "{{ url }}"), ("lang", "en")]),
                        pointers: strings(&["/url", "/data/url"]),
                    },
                    ServiceEndpoint {
                        name: Some("savefrom".to_string()),
                        url: "https://api.savefrom.net/api/convert".to_string(),
                        method: ServiceMethod::Get,
                        params: pairs(&[("url", "{{ url }}"), ("format", "mp4")]),
                        pointers: strings(&["/url", "/data/0/url"]),
                    },
                ],
                headers: Headers::new(),
                quality: Some("720p".to_string()),
            }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonApiConfig {
    pub name: String,
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub headers: Headers,
    /// Label used when the response doesn't say how tall the video is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupConfig {
    pub name: String,
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Only accept media served from hosts ending with one of these.
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Accepted media file extensions; empty means the built-in list.
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub endpoints: Vec<ServiceEndpoint>,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Reported as `<strategy>_<name>` when this endpoint succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub method: ServiceMethod,
    /// Query parameters for `GET`, form fields for `POST`.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// JSON pointers tried in order against the response body.
    pub pointers: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceMethod {
    #[default]
    Get,
    Post,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn pairs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(name, value)| (name.to_string(), value.to_string())).collect()
}

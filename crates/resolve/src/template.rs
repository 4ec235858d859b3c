//! Endpoint templating.
//!
//! Endpoint URLs, service parameters and the fallback thumbnail are [upon]
//! templates (`{{ variable }}`, `{{ value|formatter }}`) rendered against the
//! parsed post link:
//!
//! | Variable    | Description                                          |
//! |-------------|------------------------------------------------------|
//! | `shortcode` | The post's shortcode                                 |
//! | `url`       | The normalized input link                            |
//! | `path`      | Path and query of the input link, e.g. `/reel/X/`    |
//! | `host`      | Host of the input link                               |
//!
//! The `urlencode` formatter percent-encodes a value for use inside a query
//! string: `?u={{ url|urlencode }}`.

use exn::ResultExt;
use reelfetch_extract::models::PostReference;
use upon::{Engine, Template, Value};
use url::Url;

use crate::error::{ErrorKind, Result};

/// A compiled template, reusable across any number of renders.
pub struct EndpointTemplate {
    source: String,
    template: Template<'static>,
}
impl std::fmt::Debug for EndpointTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EndpointTemplate").field(&self.source).finish()
    }
}

/// Owns the [`Engine`] every [`EndpointTemplate`] is compiled and rendered
/// with.
pub struct Templates {
    engine: Engine<'static>,
}
impl Default for Templates {
    fn default() -> Self {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        Self { engine }
    }
}
impl Templates {
    /// Compiles eagerly so that syntax errors surface when the resolver is
    /// built, not on the first request.
    pub fn compile(&self, source: &str) -> Result<EndpointTemplate> {
        let template = self
            .engine
            .compile(source.to_string())
            .or_raise(|| ErrorKind::Template(source.to_string()))?;
        Ok(EndpointTemplate {
            source: source.to_string(),
            template,
        })
    }

    pub fn render(&self, template: &EndpointTemplate, context: &Value) -> Result<String> {
        template
            .template
            .render(&self.engine, context)
            .to_string()
            .or_raise(|| ErrorKind::Template(template.source.clone()))
    }

    /// Renders and parses the result as an absolute URL.
    pub fn render_url(&self, template: &EndpointTemplate, context: &Value) -> Result<Url> {
        let rendered = self.render(template, context)?;
        Url::parse(rendered.trim()).or_raise(|| ErrorKind::Template(rendered))
    }
}

/// Builds the [`upon::Value`] map exposed to templates.
pub fn context(reference: &PostReference) -> Value {
    let url = &reference.url;
    let path = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    upon::value! {
        shortcode: reference.shortcode.as_str(),
        url: url.as_str(),
        path: path,
        host: url.host_str().unwrap_or_default(),
    }
}

/// Custom [`upon`] extensions for building URLs.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};
    use url::form_urlencoded::byte_serialize;

    /// Percent-encodes strings for use as a single query string value.
    fn urlencode_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for part in byte_serialize(s.as_bytes()) {
                    write!(f, "{part}")?;
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("urlencode", urlencode_formatter);
    }
}

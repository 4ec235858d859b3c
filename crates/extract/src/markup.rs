//! Media tag scanning for rendered (HTML) pages.

use scraper::{Html, Selector};
use tracing::instrument;
use url::Url;

use crate::consts;
use crate::models::{MediaFilter, MediaUrl};
use crate::truncate::{DEFAULT_MAX_DOCUMENT_BYTES, truncate_at_tag};

/// A media URL found in a rendered page, with whatever presentation
/// metadata the page also offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupHit {
    pub url: MediaUrl,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
}

/// Scans a rendered page for a playable media URL.
///
/// Candidates are tried in order of how explicit the page is about them:
/// `<source type="video/mp4">` inside a `<video>`, `<video src>`, OpenGraph
/// video metadata, inline `"video_url"` JSON in scripts, and finally any
/// attribute pointing at an `.mp4`. Each candidate is unescaped, resolved
/// against `base` when relative, and must pass `filter`.
///
/// Pages larger than `max_bytes` are cut after their last complete tag first.
#[instrument(level = "debug", skip(html, base, filter), fields(html_size = html.len(), base = %base))]
pub fn scan(html: &[u8], base: &Url, filter: &MediaFilter, max_bytes: Option<usize>) -> Option<MarkupHit> {
    let html = truncate_at_tag(html, max_bytes.unwrap_or(DEFAULT_MAX_DOCUMENT_BYTES));
    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);
    let accept = |candidate: &str| resolve(candidate, base).filter(|url| filter.accepts(url));

    let url = attribute_values(&document, &consts::VIDEO_SOURCE_SELECTOR, "src")
        .chain(attribute_values(&document, &consts::VIDEO_SRC_SELECTOR, "src"))
        .chain(attribute_values(&document, &consts::OG_VIDEO_SELECTOR, "content"))
        .find_map(|candidate| accept(&candidate))
        .or_else(|| {
            consts::INLINE_VIDEO_URL_REGEX
                .captures_iter(&text)
                .chain(consts::MP4_ATTRIBUTE_REGEX.captures_iter(&text))
                .filter_map(|captures| captures.get(1))
                .find_map(|m| accept(m.as_str()))
        })?;

    let thumbnail = attribute_values(&document, &consts::OG_IMAGE_SELECTOR, "content")
        .chain(attribute_values(&document, &consts::VIDEO_POSTER_SELECTOR, "poster"))
        .find_map(|candidate| resolve(&candidate, base))
        .map(String::from);
    let title = attribute_values(&document, &consts::OG_TITLE_SELECTOR, "content").find(|t| !t.trim().is_empty());
    Some(MarkupHit { url, thumbnail, title })
}

fn attribute_values<'a>(
    document: &'a Html,
    selector: &'a Selector,
    attribute: &'a str,
) -> impl Iterator<Item = String> + 'a {
    document.select(selector).filter_map(move |element| element.value().attr(attribute)).map(str::to_string)
}

/// Undoes the escaping media URLs pick up when embedded in markup or inline
/// JSON (`\u0026`, `\/`, `&amp;`).
pub fn unescape(candidate: &str) -> String {
    candidate.trim().replace("\\u0026", "&").replace("\\/", "/").replace("&amp;", "&")
}

fn resolve(candidate: &str, base: &Url) -> Option<MediaUrl> {
    let candidate = unescape(candidate);
    if candidate.is_empty() {
        return None;
    }
    let url = base.join(&candidate).ok()?;
    MediaUrl::try_from(url).ok()
}

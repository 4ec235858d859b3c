//! Media URL location inside arbitrarily shaped upstream documents.
//!
//! Upstream JSON changes shape without notice, so instead of deserializing
//! into fixed structs the document is walked depth-first and each object is
//! matched against a small set of recognized [`Shape`]s. The first match
//! wins; there is no ranking across branches.

use exn::ResultExt;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::consts::{MAX_LOCATE_DEPTH, MEDIA_EXTENSIONS};
use crate::error::{ErrorKind, Result};
use crate::models::{MediaHit, MediaUrl};

/// Recognized shapes of a single object node, in priority order.
#[derive(Debug)]
enum Shape<'a> {
    /// `{"video_url": "https://…/clip.mp4"}`
    DirectHit(MediaUrl),
    /// `{"shortcode_media": {"is_video": true, "video_url": …}}`
    ShortcodeMedia(MediaHit),
    /// `{"items": [{"video_versions": [{"url": …, "height": …}, …]}]}`
    Versions(MediaHit),
    /// Nothing recognizable at this node; descend into its children.
    Unrecognized(&'a Map<String, Value>),
}
impl<'a> Shape<'a> {
    fn classify(node: &'a Map<String, Value>) -> Self {
        if let Some(url) = direct_hit(node) {
            return Self::DirectHit(url);
        }
        if let Some(hit) = shortcode_media(node) {
            return Self::ShortcodeMedia(hit);
        }
        if let Some(hit) = versions(node) {
            return Self::Versions(hit);
        }
        Self::Unrecognized(node)
    }
}

/// Searches a decoded document for a playable media URL.
///
/// # Examples
///
/// ```rust
/// use reelfetch_extract::locate;
/// use serde_json::json;
///
/// let document = json!({
///     "data": {"user": null},
///     "items": [{"video_versions": [
///         {"url": "https://cdn.example/low.mp4", "height": 480},
///         {"url": "https://cdn.example/high.mp4", "height": 1080},
///     ]}],
/// });
/// let hit = locate(&document).unwrap();
/// assert_eq!(hit.url.as_str(), "https://cdn.example/high.mp4");
/// assert_eq!(hit.quality().as_deref(), Some("1080p"));
/// ```
#[instrument(level = "trace", skip(document))]
pub fn locate(document: &Value) -> Option<MediaHit> {
    walk(document, 0)
}

/// Decodes `bytes` as JSON and [`locate`]s a media URL within it.
///
/// # Errors
///
/// Returns [`ErrorKind::MalformedDocument`] if the bytes are not JSON. A
/// well-formed document without media is `Ok(None)`.
pub fn locate_bytes(bytes: impl AsRef<[u8]>) -> Result<Option<MediaHit>> {
    let document: Value = serde_json::from_slice(bytes.as_ref()).or_raise(|| ErrorKind::MalformedDocument)?;
    Ok(locate(&document))
}

fn walk(node: &Value, depth: usize) -> Option<MediaHit> {
    if depth > MAX_LOCATE_DEPTH {
        tracing::trace!(depth, "Document nested too deeply; abandoning branch");
        return None;
    }
    match node {
        Value::Object(map) => match Shape::classify(map) {
            Shape::DirectHit(url) => Some(MediaHit::new(url)),
            Shape::ShortcodeMedia(hit) | Shape::Versions(hit) => Some(hit),
            Shape::Unrecognized(map) => map.values().find_map(|child| walk(child, depth + 1)),
        },
        Value::Array(items) => items.iter().find_map(|child| walk(child, depth + 1)),
        _ => None,
    }
}

fn url_field(node: &Map<String, Value>, field: &str) -> Option<MediaUrl> {
    node.get(field).and_then(Value::as_str).and_then(|s| MediaUrl::parse(s).ok())
}

fn number_field(node: &Map<String, Value>, field: &str) -> Option<u64> {
    let value = node.get(field)?;
    // Some endpoints send dimensions as floats or numeric strings.
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn direct_hit(node: &Map<String, Value>) -> Option<MediaUrl> {
    url_field(node, "video_url").filter(|url| url.has_extension(MEDIA_EXTENSIONS))
}

fn shortcode_media(node: &Map<String, Value>) -> Option<MediaHit> {
    let media = node.get("shortcode_media")?.as_object()?;
    if media.get("is_video").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let url = url_field(media, "video_url")?;
    let height = media.get("dimensions").and_then(Value::as_object).and_then(|d| number_field(d, "height"));
    Some(MediaHit { url, height })
}

fn versions(node: &Map<String, Value>) -> Option<MediaHit> {
    let item_versions = node
        .get("items")?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| item.get("video_versions").and_then(Value::as_array))
        .find(|versions| !versions.is_empty())?;
    let mut best: Option<(u64, MediaHit)> = None;
    for version in item_versions.iter().filter_map(Value::as_object) {
        let Some(url) = url_field(version, "url") else {
            continue;
        };
        let height = number_field(version, "height");
        let quality = height.or_else(|| number_field(version, "width")).unwrap_or(0);
        // Strictly greater: on a tie the first-seen variant is kept.
        if best.as_ref().is_none_or(|(current, _)| quality > *current) {
            best = Some((quality, MediaHit { url, height }));
        }
    }
    best.map(|(_, hit)| hit)
}

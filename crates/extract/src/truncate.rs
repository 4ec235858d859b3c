//! Bounding the size of rendered pages before they are scanned.

use memchr::memrchr;

/// Rendered embed pages are a few hundred KiB; anything far beyond that is
/// not a page worth scanning in full.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// Cuts a page to at most `max_bytes`, ending right after the last complete
/// tag in that window.
///
/// Media URLs live in attributes and in inline script text. Ending on a `>`
/// keeps every complete tag and drops any trailing text run, so a cut can
/// never leave a half-written URL behind for the scanner to pick up.
///
/// # Examples
///
/// ```rust
/// use reelfetch_extract::truncate_at_tag;
/// let html = b"<video src=\"a.mp4\"></video><script>{\"video_url\": \"https://cdn";
/// assert_eq!(truncate_at_tag(html, 50), b"<video src=\"a.mp4\"></video><script>");
/// assert_eq!(truncate_at_tag(html, 1024), html);
/// ```
pub fn truncate_at_tag(html: &[u8], max_bytes: usize) -> &[u8] {
    if html.len() <= max_bytes {
        return html;
    }
    let window = &html[..max_bytes];
    match memrchr(b'>', window) {
        Some(end) => &window[..=end],
        None => &[],
    }
}

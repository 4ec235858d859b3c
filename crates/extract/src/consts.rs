use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Path segments that directly precede a shortcode.
pub(crate) const SHORTCODE_MARKERS: &[&str] = &["p", "reel", "reels", "tv"];
/// Shortest shortcode that is ever accepted.
pub(crate) const SHORTCODE_MIN_LENGTH: usize = 10;
/// File extensions (lowercase, with the dot) that identify a playable video.
pub const MEDIA_EXTENSIONS: &[&str] = &[".mp4", ".m4v", ".mov", ".webm"];
/// Guard against pathological nesting in upstream documents.
pub const MAX_LOCATE_DEPTH: usize = 50;

regex!(SHORTCODE_REGEX, r"^[A-Za-z0-9_-]+$");
// Scheme-less input such as `instagram.com/reel/...`.
regex!(BARE_HOST_REGEX, r"^[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+(?:[/?#]|$)");

selector!(VIDEO_SOURCE_SELECTOR, r#"video source[type="video/mp4"][src]"#);
selector!(VIDEO_SRC_SELECTOR, "video[src]");
selector!(OG_VIDEO_SELECTOR, r#"meta[property="og:video"][content], meta[property="og:video:secure_url"][content]"#);
selector!(OG_IMAGE_SELECTOR, r#"meta[property="og:image"][content]"#);
selector!(OG_TITLE_SELECTOR, r#"meta[property="og:title"][content]"#);
selector!(VIDEO_POSTER_SELECTOR, "video[poster]");
// Inline JSON blobs embedded in `<script>` tags.
regex!(INLINE_VIDEO_URL_REGEX, r#""video_url"\s*:\s*"([^"]+)""#);
// Last resort: any attribute pointing at an mp4.
regex!(MP4_ATTRIBUTE_REGEX, r#"(?:src|content)="([^"]+\.mp4[^"]*)""#);

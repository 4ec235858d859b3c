//! Pure parsing for post resolution: no network, no shared state.
//!
//! - [`ShortcodeParser`] turns a free-form post link into a [`Shortcode`](models::Shortcode).
//! - [`locate`] finds a media URL inside an arbitrarily shaped JSON document.
//! - [`markup::scan`] finds a media URL inside a rendered HTML page.
//! - [`models`] holds the outcome and result types shared by the rest of the
//!   workspace.

mod consts;
pub mod error;
mod locate;
pub mod markup;
pub mod models;
mod shortcode;
mod truncate;

pub use crate::consts::{MAX_LOCATE_DEPTH, MEDIA_EXTENSIONS};
pub use crate::locate::{locate, locate_bytes};
pub use crate::shortcode::{DEFAULT_DOMAINS, ShortcodeParser};
pub use crate::truncate::{DEFAULT_MAX_DOCUMENT_BYTES, truncate_at_tag};

use crate::error::Result;
use crate::models::Shortcode;

/// Easy, top-level entrypoint: the [`Shortcode`] of a link on one of the
/// [`DEFAULT_DOMAINS`].
///
/// ```rust
/// let shortcode = reelfetch_extract::shortcode("https://www.instagram.com/p/DQhNBbODMoU/").unwrap();
/// assert_eq!(shortcode.as_str(), "DQhNBbODMoU");
/// ```
pub fn shortcode(url: &str) -> Result<Shortcode> {
    Ok(ShortcodeParser::default().parse(url)?.shortcode)
}

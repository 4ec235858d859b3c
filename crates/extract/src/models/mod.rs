mod media;
mod outcome;
mod result;
mod shortcode;

pub use self::media::{MediaFilter, MediaHit, MediaUrl};
pub use self::outcome::{Extraction, Outcome};
pub use self::result::{CanonicalResult, Failure};
pub use self::shortcode::{PostReference, Shortcode};

//! In-memory cache for resolved posts.
//!
//! The cache is ephemeral: nothing survives the process, and a miss only
//! ever costs a fresh resolution.
//!
//! # Architecture
//! Each result is stored exactly once, under the [`CacheKey`] derived from
//! the input link. Successful results are also given a [`ResultId`], which
//! is kept in an alias table pointing back at the owning key. Expiring an
//! entry removes the alias with it and leaves a short-lived tombstone, so a
//! later lookup by id can tell "expired" apart from "never existed".

mod cache;
mod entry;
mod key;

pub use crate::cache::{CacheStats, Lookup, ResultCache};
pub use crate::key::{CacheKey, ResultId};

//! Resolution of post links into playable media.
//!
//! # Architecture
//! - [`Resolver`] is the entry point: it keys each link into the
//!   [`ResultCache`](reelfetch_cache::ResultCache) and only runs the
//!   [`Orchestrator`] on a miss.
//! - The [`Orchestrator`] parses the link, then walks the configured
//!   [`Strategy`] list in order, each under its own deadline, until one finds
//!   the media.
//! - Strategies send [`Request`](transport::Request)s through a
//!   [`Transport`](transport::Transport), so tests never touch the network.

pub mod error;
mod headers;
mod orchestrator;
mod resolver;
pub mod strategy;
mod template;
pub mod transport;

pub use crate::headers::HeaderSet;
pub use crate::orchestrator::{Orchestrator, OrchestratorOptions};
pub use crate::resolver::Resolver;
pub use crate::strategy::{Strategy, StrategyHandle, Target, Toolkit};
pub use crate::template::{EndpointTemplate, Templates};
pub use reelfetch_extract::models::{CanonicalResult, Failure};

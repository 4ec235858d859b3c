//! Layered configuration for reelfetch.
//!
//! Layers, later ones winning: built-in defaults, an optional file (TOML,
//! YAML or JSON, picked by extension), then `REELFETCH_` environment
//! variables with `__` separating nested keys, e.g.
//! `REELFETCH_CACHE__TTL_SECS=60`.

pub mod error;
mod sections;
mod strategy;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::instrument;

pub use crate::sections::{CacheConfig, ResolverConfig};
pub use crate::strategy::{
    Headers, JsonApiConfig, MarkupConfig, ServiceConfig, ServiceEndpoint, ServiceMethod, StrategyConfig,
};
use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "REELFETCH_";
const APPLICATION: &str = "reelfetch";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub resolver: ResolverConfig,
    /// Tried in order until one finds the media.
    pub strategies: Vec<StrategyConfig>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            resolver: ResolverConfig::default(),
            strategies: StrategyConfig::defaults(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration. An explicit `path` must exist;
    /// without one, the per-user file is used when present.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = merge_file(figment, path)?,
            None => {
                if let Some(path) = Self::default_path().filter(|path| path.is_file()) {
                    tracing::debug!(path = %path.display(), "using per-user configuration file");
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Where the per-user configuration file lives on this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            exn::bail!(ErrorKind::invalid("cache.ttl_secs", "must be greater than zero"));
        }
        if self.cache.sweep_interval_secs == 0 {
            exn::bail!(ErrorKind::invalid("cache.sweep_interval_secs", "must be greater than zero"));
        }
        if self.resolver.domains.iter().all(|domain| domain.trim().is_empty()) {
            exn::bail!(ErrorKind::invalid("resolver.domains", "at least one domain is required"));
        }
        if self.resolver.strategy_timeout_ms == 0 {
            exn::bail!(ErrorKind::invalid("resolver.strategy_timeout_ms", "must be greater than zero"));
        }
        if self.strategies.is_empty() {
            exn::bail!(ErrorKind::invalid("strategies", "at least one strategy is required"));
        }
        let mut names = HashSet::new();
        for strategy in &self.strategies {
            let name = strategy.name();
            if name.trim().is_empty() {
                exn::bail!(ErrorKind::invalid("strategies", "every strategy needs a name"));
            }
            if !names.insert(name) {
                exn::bail!(ErrorKind::invalid("strategies", format!("duplicate strategy name {name:?}")));
            }
            if strategy.endpoint_count() == 0 {
                exn::bail!(ErrorKind::invalid("strategies", format!("strategy {name:?} has no endpoints")));
            }
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    };
    Ok(figment)
}

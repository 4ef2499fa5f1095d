mod basic;
mod blob;
mod engine;

pub use basic::BasicConfig;
pub use blob::BlobConfig;
pub use engine::EngineConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Store and logging settings (see `basic` table in lookbook.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Association engine behavior (see `engine` table in lookbook.toml).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Image storage (see `blob` table in lookbook.toml).
    #[serde(default)]
    pub blob: BlobConfig,
}

const DEFAULT_CONFIG_FILE: &str = "lookbook.toml";
const ENV_PREFIX: &str = "LOOKBOOK_";

impl Config {
    /// Builds a Figment that merges defaults, `lookbook.toml` if present, and
    /// `LOOKBOOK_`-prefixed environment variables (`__` separates tables, e.g.
    /// `LOOKBOOK_ENGINE__EXCLUSIVE_VOTING=true`).
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates configuration.
    pub fn load() -> Result<Self, figment::Error> {
        let cfg: Self = Self::figment().extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.basic.database_url.trim().is_empty() {
            return Err(figment::Error::from(
                "basic.database_url must be set and non-empty".to_string(),
            ));
        }
        if self.engine.conflict_retry_min_delay_ms > self.engine.conflict_retry_max_delay_ms {
            return Err(figment::Error::from(
                "engine.conflict_retry_min_delay_ms must not exceed engine.conflict_retry_max_delay_ms"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

mod basic;
mod database;

pub use basic::BasicConfig;
pub use database::DatabaseConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Table naming and pool settings (see `database` table in config.toml).
    #[serde(default)]
    pub database: DatabaseConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults, `config.toml` if present, then
    /// `SIMPLIFIED_`-prefixed environment variables (`SIMPLIFIED_DATABASE__PREFIX=cjms_`).
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed("SIMPLIFIED_").split("__"))
    }

    /// Loads configuration from defaults, the optional TOML file and the environment.
    pub fn from_optional_toml() -> Self {
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml + env): {err}")
        });
        if cfg.basic.database_url.trim().is_empty() {
            panic!("basic.database_url must be set and non-empty");
        }
        cfg
    }
}

/// Global, lazily-initialized configuration instance. Used by the binary only; library
/// components receive their settings explicitly.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

use serde::{Deserialize, Serialize};

/// Table naming and connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Prepended to every physical table name, including the schema metadata table.
    /// TOML: `database.prefix`. Default: empty.
    #[serde(default)]
    pub prefix: String,

    /// Character set for created tables.
    /// TOML: `database.charset`. Default: `utf8mb4`.
    #[serde(default = "default_charset")]
    pub charset: String,

    /// Storage engine for created tables.
    /// TOML: `database.engine`. Default: `InnoDB`.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Pool size. TOML: `database.max_connections`. Default: `10`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing the statement.
    /// TOML: `database.acquire_timeout_secs`. Default: `5`.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            charset: default_charset(),
            engine: default_engine(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_engine() -> String {
    "InnoDB".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

use crate::config::DatabaseConfig;
use crate::db::quote_ident;

const METADATA_TABLE: &str = "table_structure";

/// Maps logical table names to physical ones and carries the DDL table options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNaming {
    prefix: String,
    charset: String,
    engine: String,
}

impl TableNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            charset: "utf8mb4".to_string(),
            engine: "InnoDB".to_string(),
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            charset: config.charset.clone(),
            engine: config.engine.clone(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn physical(&self, table: &str) -> String {
        format!("{}{table}", self.prefix)
    }

    /// Backtick-quoted physical name, ready to splice into SQL.
    pub fn quoted(&self, table: &str) -> String {
        quote_ident(&self.physical(table))
    }

    pub fn metadata_table(&self) -> String {
        self.quoted(METADATA_TABLE)
    }

    /// `ENGINE=… DEFAULT CHARSET=…` suffix for `CREATE TABLE`.
    pub fn table_options(&self) -> String {
        format!("ENGINE={} DEFAULT CHARSET={}", self.engine, self.charset)
    }
}

impl Default for TableNaming {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_prepended_to_every_table() {
        let naming = TableNaming::new("cjms_");
        assert_eq!(naming.physical("users"), "cjms_users");
        assert_eq!(naming.quoted("users"), "`cjms_users`");
        assert_eq!(naming.metadata_table(), "`cjms_table_structure`");
    }

    #[test]
    fn options_follow_config() {
        let config = DatabaseConfig {
            engine: "MyISAM".to_string(),
            charset: "latin1".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(
            TableNaming::from_config(&config).table_options(),
            "ENGINE=MyISAM DEFAULT CHARSET=latin1"
        );
    }
}

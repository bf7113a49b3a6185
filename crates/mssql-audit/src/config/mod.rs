//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

/// Starter configuration written by `mssql-audit init`.
pub const CONFIG_TEMPLATE: &str = r#"# mssql-audit configuration

source:
  type: mssql
  host: localhost
  port: 1433
  database: my_database
  user: sa
  password: change_me
  # schema: dbo            # restrict the catalog read to one schema
  encrypt: "true"
  trust_server_cert: false

generation:
  # Tables to audit (exact, case-sensitive names)
  tables:
    - Customer
    - Order
  # ignore | warn | error
  on_missing_table: warn
  # abort | skip
  on_invalid_table: abort

output:
  path: audit.sql
  stdout: false
"#;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Short `host:port/database` label for logs.
    pub fn describe(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Whether the connection should be encrypted.
    pub fn encryption_enabled(&self) -> bool {
        !matches!(
            self.encrypt.to_lowercase().as_str(),
            "false" | "no" | "0" | "disable"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config = Config::from_yaml(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.generation.tables, vec!["Customer", "Order"]);
        assert_eq!(config.generation.on_missing_table, MissingTablePolicy::Warn);
        assert_eq!(config.generation.on_invalid_table, InvalidTablePolicy::Abort);
        let source = config.source.unwrap();
        assert_eq!(source.port, 1433);
        assert!(source.schema.is_none());
    }

    #[test]
    fn test_snapshot_only_config() {
        let yaml = "generation:\n  tables: [Driver]\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.source.is_none());
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_policies_parse_snake_case() {
        let yaml = "generation:\n  tables: [Driver]\n  on_missing_table: error\n  on_invalid_table: skip\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.generation.on_missing_table, MissingTablePolicy::Error);
        assert_eq!(config.generation.on_invalid_table, InvalidTablePolicy::Skip);
    }

    #[test]
    fn test_encryption_flag() {
        let config = Config::from_yaml(CONFIG_TEMPLATE).unwrap();
        let mut source = config.source.unwrap();
        assert!(source.encryption_enabled());
        source.encrypt = "disable".into();
        assert!(!source.encryption_enabled());
    }
}

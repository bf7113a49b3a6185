//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::error::{AuditError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if let Some(source) = &config.source {
        if source.host.is_empty() {
            return Err(AuditError::Config("source.host is required".into()));
        }
        if source.database.is_empty() {
            return Err(AuditError::Config("source.database is required".into()));
        }
        if source.user.is_empty() {
            return Err(AuditError::Config("source.user is required".into()));
        }
        if source.r#type != "mssql" {
            return Err(AuditError::Config(format!(
                "source.type must be 'mssql', got '{}'",
                source.r#type
            )));
        }
        if let Some(schema) = &source.schema {
            validate_identifier(schema)?;
        }
    }

    // The table list is never inferred from the catalog
    if config.generation.tables.is_empty() {
        return Err(AuditError::Config(
            "generation.tables must list at least one table".into(),
        ));
    }
    for table in &config.generation.tables {
        validate_identifier(table)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, OutputConfig, SourceConfig};

    fn valid_config() -> Config {
        Config {
            source: Some(SourceConfig {
                r#type: "mssql".to_string(),
                host: "localhost".to_string(),
                port: 1433,
                database: "tdc".to_string(),
                user: "sa".to_string(),
                password: "password".to_string(),
                schema: None,
                encrypt: "false".to_string(),
                trust_server_cert: true,
                connect_timeout_secs: 30,
            }),
            generation: GenerationConfig {
                tables: vec!["Driver".to_string(), "Zone".to_string()],
                on_missing_table: Default::default(),
                on_invalid_table: Default::default(),
            },
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_source_host() {
        let mut config = valid_config();
        config.source.as_mut().unwrap().host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_wrong_source_type() {
        let mut config = valid_config();
        config.source.as_mut().unwrap().r#type = "postgres".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_table_list_rejected() {
        let mut config = valid_config();
        config.generation.tables.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("generation.tables"));
    }

    #[test]
    fn test_table_name_with_null_byte_rejected() {
        let mut config = valid_config();
        config.generation.tables.push("Bad\0Table".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_no_source_is_allowed() {
        let mut config = valid_config();
        config.source = None;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let mut config = valid_config();
        config.source.as_mut().unwrap().password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }
}

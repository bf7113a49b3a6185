//! Error types for the audit generator.

use std::fmt;

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for tables that fail audit eligibility checks.
pub const EXIT_VALIDATION_ERROR: u8 = 2;
/// Exit code for catalog read failures.
pub const EXIT_SOURCE_ERROR: u8 = 3;
/// Exit code for anything not covered by a more specific code.
pub const EXIT_GENERAL_ERROR: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for audit generation.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration error (invalid YAML, missing fields, bad identifiers).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog query failed or the server was unreachable.
    #[error("Source database error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// Could not establish a connection to the source.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// A table does not satisfy the audit eligibility rules.
    #[error("Table '{table}' cannot be audited: {rule}")]
    Validation { table: String, rule: ValidationRule },

    /// An internal function was called outside its preconditions.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// Requested tables were not found in the catalog.
    #[error("Requested tables not found in catalog: {}", .0.join(", "))]
    MissingTables(Vec<String>),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Eligibility rule a table failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// LOB columns present but no identity column.
    NoIdentityColumn,
    /// LOB columns present and more than one identity column.
    MultipleIdentityColumns(usize),
    /// The identity column is not named `{Table}Id`.
    IdentityNameMismatch { expected: String, actual: String },
    /// The identity column is not smallint, int or bigint.
    IdentityTypeNotInteger { column: String, type_name: String },
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::NoIdentityColumn => {
                write!(f, "table has LOB columns but no identity column")
            }
            ValidationRule::MultipleIdentityColumns(n) => write!(
                f,
                "table has LOB columns and {} identity columns (exactly one required)",
                n
            ),
            ValidationRule::IdentityNameMismatch { expected, actual } => write!(
                f,
                "table has LOB columns and its identity column '{}' is not named '{}'",
                actual, expected
            ),
            ValidationRule::IdentityTypeNotInteger { column, type_name } => write!(
                f,
                "table has LOB columns and identity column '{}' has type '{}' \
                 (expected smallint, int or bigint)",
                column, type_name
            ),
        }
    }
}

impl AuditError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl Into<String>, context: impl Into<String>) -> Self {
        AuditError::Connection {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Validation error
    pub fn validation(table: impl Into<String>, rule: ValidationRule) -> Self {
        AuditError::Validation {
            table: table.into(),
            rule,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AuditError::Config(_) | AuditError::Yaml(_) | AuditError::MissingTables(_) => {
                EXIT_CONFIG_ERROR
            }
            AuditError::Validation { .. } => EXIT_VALIDATION_ERROR,
            AuditError::Source(_) | AuditError::Connection { .. } => EXIT_SOURCE_ERROR,
            AuditError::Io(_) => EXIT_IO_ERROR,
            AuditError::Contract(_) | AuditError::Json(_) => EXIT_GENERAL_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for audit generation.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_table_and_rule() {
        let err = AuditError::validation("Document", ValidationRule::NoIdentityColumn);
        let msg = err.to_string();
        assert!(msg.contains("'Document'"));
        assert!(msg.contains("no identity column"));
        assert_eq!(err.exit_code(), EXIT_VALIDATION_ERROR);
    }

    #[test]
    fn test_missing_tables_lists_names() {
        let err = AuditError::MissingTables(vec!["Zone".into(), "Shape".into()]);
        assert_eq!(
            err.to_string(),
            "Requested tables not found in catalog: Zone, Shape"
        );
    }

    #[test]
    fn test_io_error_exit_code() {
        let err: AuditError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml").into();
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
        assert!(err.format_detailed().starts_with("Error: IO error"));
    }
}

//! Identifier validation and SQL Server quoting.
//!
//! Identifiers (schema, table, column, trigger and constraint names) end up
//! spliced into DDL text, so every one of them goes through [`quote_ident`]
//! and every object name embedded in a string literal goes through
//! [`quote_literal`]. Names coming from configuration are checked with
//! [`validate_identifier`] before a run starts.

use crate::error::{AuditError, Result};

/// Maximum identifier length for SQL Server (`sysname` is 128 characters).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `AuditError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AuditError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(AuditError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(AuditError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} characters (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.chars().count(),
            name
        )));
    }

    Ok(())
}

/// Quote a SQL Server identifier using brackets.
///
/// Closing brackets inside the name are doubled.
///
/// ```
/// use mssql_audit::core::identifier::quote_ident;
/// assert_eq!(quote_ident("Driver"), "[Driver]");
/// assert_eq!(quote_ident("odd]name"), "[odd]]name]");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Wrap text in a single-quoted string literal, doubling embedded quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

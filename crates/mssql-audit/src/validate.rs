//! Audit eligibility checks.
//!
//! Tables with LOB columns get triggers that look up the previous audit row
//! by identity value, so they need exactly one integer identity column named
//! `{Table}Id`. Tables without LOB columns always pass.

use crate::core::TableAggregate;
use crate::error::{AuditError, Result, ValidationRule};

/// Check a table against the eligibility rules.
///
/// # Errors
///
/// Returns `AuditError::Validation` naming the table and the first rule it breaks.
pub fn validate_table(table: &TableAggregate) -> Result<()> {
    check(table).map_err(|rule| AuditError::validation(table.name(), rule))
}

fn check(table: &TableAggregate) -> std::result::Result<(), ValidationRule> {
    if !table.has_lob_columns() {
        return Ok(());
    }

    let identity = match table.identity_columns().as_slice() {
        [] => return Err(ValidationRule::NoIdentityColumn),
        [only] => *only,
        many => return Err(ValidationRule::MultipleIdentityColumns(many.len())),
    };

    let expected = table.expected_identity_name();
    if !identity.column_name.eq_ignore_ascii_case(&expected) {
        return Err(ValidationRule::IdentityNameMismatch {
            expected,
            actual: identity.column_name.clone(),
        });
    }

    if !identity.is_integer() {
        return Err(ValidationRule::IdentityTypeNotInteger {
            column: identity.column_name.clone(),
            type_name: identity.type_name.clone(),
        });
    }

    Ok(())
}

//! Declared type text for audit columns.

use crate::core::schema::{ColumnMetadata, UNBOUNDED_LENGTH};
use crate::error::{AuditError, Result};

/// Format a column's declared type from its raw catalog facets.
pub fn declared_type(column: &ColumnMetadata) -> String {
    format_type(
        &column.type_name,
        column.max_length,
        column.precision,
        column.scale,
    )
}

/// Format a raw MSSQL type with length/precision where the engine needs it.
///
/// Total over every type name: anything unrecognized is rendered as the bare
/// keyword.
pub fn format_type(type_name: &str, max_length: i32, precision: i32, scale: i32) -> String {
    let name = type_name.to_lowercase();
    match name.as_str() {
        // Variable length types
        "varchar" | "nvarchar" | "varbinary" => {
            if max_length == UNBOUNDED_LENGTH {
                format!("{}(max)", name)
            } else {
                format!("{}({})", name, max_length)
            }
        }

        // float(53) is the default double-precision float
        "float" => {
            if precision == 53 && scale == 0 {
                name
            } else {
                format!("{}({},{})", name, precision, scale)
            }
        }

        "double" => format!("{}({},{})", name, precision, scale),

        // (18, 0) is the engine default
        "decimal" | "numeric" => {
            if precision == 18 && scale == 0 {
                name
            } else {
                format!("{}({},{})", name, precision, scale)
            }
        }

        _ => name,
    }
}

/// Comparable type a LOB column is converted to before equality tests.
///
/// # Errors
///
/// Returns `AuditError::Contract` when called with a non-LOB column.
pub fn lob_comparable_type(column: &ColumnMetadata) -> Result<&'static str> {
    match column.type_key().as_str() {
        "ntext" => Ok("nvarchar(max)"),
        "text" => Ok("varchar(max)"),
        "image" => Ok("varbinary(max)"),
        other => Err(AuditError::Contract(format!(
            "column '{}' of type '{}' is not a LOB column",
            column.column_name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::test_support::column;

    #[test]
    fn test_variable_length_types() {
        assert_eq!(format_type("varchar", 100, 0, 0), "varchar(100)");
        assert_eq!(format_type("nvarchar", 50, 0, 0), "nvarchar(50)");
        assert_eq!(format_type("varbinary", 16, 0, 0), "varbinary(16)");
    }

    #[test]
    fn test_unbounded_renders_max() {
        for ty in ["varchar", "nvarchar", "varbinary"] {
            let formatted = format_type(ty, -1, 0, 0);
            assert_eq!(formatted, format!("{ty}(max)"));
            assert!(!formatted.contains("-1"));
        }
    }

    #[test]
    fn test_type_name_lower_cased() {
        assert_eq!(format_type("NVarChar", -1, 0, 0), "nvarchar(max)");
        assert_eq!(format_type("INT", 4, 10, 0), "int");
    }

    #[test]
    fn test_float() {
        assert_eq!(format_type("float", 8, 53, 0), "float");
        assert_eq!(format_type("float", 4, 24, 0), "float(24,0)");
    }

    #[test]
    fn test_double_always_parameterized() {
        assert_eq!(format_type("double", 8, 53, 0), "double(53,0)");
    }

    #[test]
    fn test_decimal_types() {
        assert_eq!(format_type("decimal", 9, 18, 0), "decimal");
        assert_eq!(format_type("decimal", 9, 10, 2), "decimal(10,2)");
        assert_eq!(format_type("numeric", 9, 18, 0), "numeric");
        assert_eq!(format_type("numeric", 13, 28, 6), "numeric(28,6)");
    }

    #[test]
    fn test_fallthrough_is_bare_keyword() {
        assert_eq!(format_type("datetime2", 8, 27, 7), "datetime2");
        assert_eq!(format_type("char", 1, 0, 0), "char");
        assert_eq!(format_type("uniqueidentifier", 16, 0, 0), "uniqueidentifier");
        assert_eq!(format_type("image", 16, 0, 0), "image");
        assert_eq!(format_type("some_future_type", 3, 2, 1), "some_future_type");
    }

    #[test]
    fn test_clr_types_are_bare_keywords() {
        assert_eq!(format_type("geography", -1, 0, 0), "geography");
        assert_eq!(format_type("geometry", -1, 0, 0), "geometry");
        assert_eq!(format_type("hierarchyid", 892, 0, 0), "hierarchyid");
    }

    #[test]
    fn test_lob_comparable_types() {
        assert_eq!(lob_comparable_type(&column("T", "A", "ntext")).unwrap(), "nvarchar(max)");
        assert_eq!(lob_comparable_type(&column("T", "A", "TEXT")).unwrap(), "varchar(max)");
        assert_eq!(lob_comparable_type(&column("T", "A", "image")).unwrap(), "varbinary(max)");
    }

    #[test]
    fn test_lob_comparable_type_rejects_ordinary_column() {
        let err = lob_comparable_type(&column("T", "Name", "nvarchar")).unwrap_err();
        assert!(matches!(err, AuditError::Contract(_)));
        assert!(err.to_string().contains("'Name'"));
    }
}

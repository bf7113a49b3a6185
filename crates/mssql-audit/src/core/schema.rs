//! Column and table metadata types.
//!
//! [`ColumnMetadata`] is one row of the catalog read; [`TableAggregate`] is
//! the per-table view built by the assembler and consumed by validation and
//! DDL synthesis.

use serde::{Deserialize, Serialize};

/// Max length value the catalog uses for `(max)` columns.
pub const UNBOUNDED_LENGTH: i32 = -1;

/// Legacy large-object types that cannot be compared with `=` in triggers.
pub const LOB_TYPES: &[&str] = &["ntext", "text", "image"];

/// Types accepted for the identity column of a table with LOB columns.
pub const INTEGER_TYPES: &[&str] = &["smallint", "int", "bigint"];

/// Column metadata as returned by the catalog, one per physical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Schema name.
    pub schema_name: String,

    /// Table name.
    pub table_name: String,

    /// Column name.
    pub column_name: String,

    /// Raw type name (e.g., "int", "nvarchar", "image").
    pub type_name: String,

    /// Maximum length in characters for string types, bytes for binary
    /// types, [`UNBOUNDED_LENGTH`] for `(max)`.
    pub max_length: i32,

    /// Numeric precision.
    pub precision: i32,

    /// Numeric scale.
    pub scale: i32,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Whether the column is an identity column.
    pub is_identity: bool,
}

impl ColumnMetadata {
    /// Lower-cased raw type name.
    pub fn type_key(&self) -> String {
        self.type_name.to_lowercase()
    }

    /// True for `ntext`, `text` and `image` columns.
    pub fn is_lob(&self) -> bool {
        is_lob_type(&self.type_name)
    }

    /// True for `smallint`, `int` and `bigint` columns.
    pub fn is_integer(&self) -> bool {
        INTEGER_TYPES.contains(&self.type_key().as_str())
    }
}

/// Check whether a raw type name is one of the LOB types.
pub fn is_lob_type(type_name: &str) -> bool {
    LOB_TYPES.contains(&type_name.to_lowercase().as_str())
}

/// All columns of one table, in audit column order.
///
/// Built once by [`crate::assemble`]; the fields are private so the derived
/// LOB flag can never drift from the column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableAggregate {
    schema: String,
    name: String,
    columns: Vec<ColumnMetadata>,
    has_lob_columns: bool,
}

impl TableAggregate {
    /// Build an aggregate. Columns are kept in the given order.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<ColumnMetadata>,
    ) -> Self {
        let has_lob_columns = columns.iter().any(ColumnMetadata::is_lob);
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
            has_lob_columns,
        }
    }

    /// Schema name.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in audit order.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Whether any column is a LOB column.
    pub fn has_lob_columns(&self) -> bool {
        self.has_lob_columns
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Identity columns, in column order.
    pub fn identity_columns(&self) -> Vec<&ColumnMetadata> {
        self.columns.iter().filter(|c| c.is_identity).collect()
    }

    /// The identity column, when there is exactly one.
    pub fn single_identity(&self) -> Option<&ColumnMetadata> {
        match self.identity_columns().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Identity column name a table with LOB columns must use: `{Table}Id`.
    pub fn expected_identity_name(&self) -> String {
        format!("{}Id", self.name)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_is_lob_case_insensitive() {
        assert!(column("Doc", "Body", "ntext").is_lob());
        assert!(column("Doc", "Body", "TEXT").is_lob());
        assert!(column("Doc", "Body", "Image").is_lob());
        assert!(!column("Doc", "Body", "varbinary").is_lob());
        assert!(!column("Doc", "Body", "nvarchar").is_lob());
    }

    #[test]
    fn test_has_lob_columns_derived() {
        let plain = TableAggregate::new(
            "dbo",
            "Driver",
            vec![identity("Driver", "DriverId", "int"), column("Driver", "Name", "nvarchar")],
        );
        assert!(!plain.has_lob_columns());

        let lob = TableAggregate::new(
            "dbo",
            "Doc",
            vec![identity("Doc", "DocId", "bigint"), column("Doc", "Body", "image")],
        );
        assert!(lob.has_lob_columns());
    }

    #[test]
    fn test_single_identity() {
        let none = TableAggregate::new("dbo", "T", vec![column("T", "A", "int")]);
        assert!(none.single_identity().is_none());

        let two = TableAggregate::new(
            "dbo",
            "T",
            vec![identity("T", "A", "int"), identity("T", "B", "int")],
        );
        assert!(two.single_identity().is_none());
        assert_eq!(two.identity_columns().len(), 2);

        let one = TableAggregate::new("dbo", "T", vec![identity("T", "TId", "int")]);
        assert_eq!(one.single_identity().unwrap().column_name, "TId");
        assert_eq!(one.expected_identity_name(), "TId");
        assert_eq!(one.full_name(), "dbo.T");
    }

    #[test]
    fn test_is_integer() {
        assert!(column("T", "A", "smallint").is_integer());
        assert!(column("T", "A", "INT").is_integer());
        assert!(column("T", "A", "bigint").is_integer());
        assert!(!column("T", "A", "tinyint").is_integer());
        assert!(!column("T", "A", "decimal").is_integer());
    }

    #[test]
    fn test_column_metadata_json_shape() {
        let col = sized(nullable(column("Driver", "Name", "nvarchar")), 50);
        let json = serde_json::to_string(&col).unwrap();
        assert!(json.contains("\"column_name\":\"Name\""));
        assert!(json.contains("\"max_length\":50"));
        let back: ColumnMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, col);
    }
}

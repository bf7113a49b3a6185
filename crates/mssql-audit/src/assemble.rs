//! Group catalog rows into per-table aggregates.

use std::collections::HashMap;

use tracing::debug;

use crate::core::{ColumnMetadata, TableAggregate};

/// Aggregates for the requested tables, plus the requested names that had
/// no columns in the catalog.
#[derive(Debug, Clone, Default)]
pub struct Assembled {
    /// One aggregate per distinct (schema, table), in first-appearance order.
    pub tables: Vec<TableAggregate>,
    /// Requested table names with no matching aggregate, in request order.
    pub missing: Vec<String>,
}

/// Column order within an audit table: identity columns first, then by name
/// ignoring case, as the catalog's default collation orders them. Names that
/// differ only in case fall back to byte order.
///
/// The catalog query already orders rows this way, but the generated DDL
/// depends on it, so it is applied here rather than assumed.
pub fn column_sort_key(column: &ColumnMetadata) -> (bool, String, &str) {
    (
        !column.is_identity,
        column.column_name.to_lowercase(),
        column.column_name.as_str(),
    )
}

/// Group `columns` by (schema, table) and keep only tables named in `requested`.
///
/// Matching is exact and case-sensitive on the table name; the schema is not
/// considered. Rows of one table do not need to be adjacent.
pub fn assemble_tables(columns: Vec<ColumnMetadata>, requested: &[String]) -> Assembled {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<ColumnMetadata>> = HashMap::new();

    for column in columns {
        if !requested.iter().any(|t| t == &column.table_name) {
            continue;
        }
        let key = (column.schema_name.clone(), column.table_name.clone());
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(column);
    }

    let tables: Vec<TableAggregate> = order
        .into_iter()
        .filter_map(|key| {
            let mut cols = groups.remove(&key)?;
            cols.sort_by(|a, b| column_sort_key(a).cmp(&column_sort_key(b)));
            let (schema, name) = key;
            debug!("Assembled {}.{} with {} columns", schema, name, cols.len());
            Some(TableAggregate::new(schema, name, cols))
        })
        .collect();

    let mut missing: Vec<String> = Vec::new();
    for name in requested {
        if !tables.iter().any(|t| t.name() == name) && !missing.contains(name) {
            missing.push(name.clone());
        }
    }

    Assembled { tables, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::test_support::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_scattered_rows() {
        let rows = vec![
            identity("Driver", "DriverId", "int"),
            column("Zone", "Code", "varchar"),
            column("Driver", "Name", "nvarchar"),
            identity("Zone", "ZoneId", "int"),
        ];

        let result = assemble_tables(rows, &names(&["Driver", "Zone"]));
        assert_eq!(result.tables.len(), 2);
        assert_eq!(result.tables[0].name(), "Driver");
        assert_eq!(result.tables[0].columns().len(), 2);
        assert_eq!(result.tables[1].name(), "Zone");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_identity_first_then_alphabetical() {
        let rows = vec![
            column("Zone", "Name", "nvarchar"),
            column("Zone", "Code", "varchar"),
            identity("Zone", "ZoneId", "int"),
            column("Zone", "Area", "float"),
        ];

        let result = assemble_tables(rows, &names(&["Zone"]));
        let order: Vec<&str> = result.tables[0]
            .columns()
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        assert_eq!(order, vec!["ZoneId", "Area", "Code", "Name"]);
    }

    #[test]
    fn test_mixed_case_names_sort_like_catalog_collation() {
        let rows = vec![
            identity("Zone", "ZoneId", "int"),
            column("Zone", "area", "float"),
            column("Zone", "Code", "varchar"),
            column("Zone", "code", "varchar"),
            column("Zone", "Bay", "int"),
        ];

        let result = assemble_tables(rows, &names(&["Zone"]));
        let order: Vec<&str> = result.tables[0]
            .columns()
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        assert_eq!(order, vec!["ZoneId", "area", "Bay", "Code", "code"]);
    }

    #[test]
    fn test_filters_to_requested_case_sensitive() {
        let rows = vec![
            identity("Driver", "DriverId", "int"),
            identity("driver", "driverId", "int"),
            identity("Shape", "ShapeId", "int"),
        ];

        let result = assemble_tables(rows, &names(&["Driver"]));
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].name(), "Driver");
    }

    #[test]
    fn test_schema_ignored_for_filter_but_kept_for_grouping() {
        let mut other = identity("Driver", "DriverId", "int");
        other.schema_name = "sales".to_string();
        let rows = vec![identity("Driver", "DriverId", "int"), other];

        let result = assemble_tables(rows, &names(&["Driver"]));
        assert_eq!(result.tables.len(), 2);
        assert_eq!(result.tables[0].schema(), "dbo");
        assert_eq!(result.tables[1].schema(), "sales");
    }

    #[test]
    fn test_reports_missing_tables() {
        let rows = vec![identity("Driver", "DriverId", "int")];

        let result = assemble_tables(rows, &names(&["Driver", "Tracking", "Tracking"]));
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.missing, vec!["Tracking"]);
    }

    #[test]
    fn test_empty_request_yields_nothing() {
        let rows = vec![identity("Driver", "DriverId", "int")];
        let result = assemble_tables(rows, &[]);
        assert!(result.tables.is_empty());
        assert!(result.missing.is_empty());
    }
}

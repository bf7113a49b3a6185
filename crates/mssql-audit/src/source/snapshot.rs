//! JSON snapshot of catalog rows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::assemble::column_sort_key;
use crate::core::ColumnMetadata;
use crate::error::Result;

use super::MetadataSource;

/// Reads column metadata previously saved by [`write_snapshot`].
///
/// The file is a JSON array of column objects. Rows are re-sorted into
/// catalog order so hand-edited files behave like a live read.
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(content: &str) -> Result<Vec<ColumnMetadata>> {
        let mut columns: Vec<ColumnMetadata> = serde_json::from_str(content)?;

        columns.sort_by(|a, b| {
            a.table_name
                .to_lowercase()
                .cmp(&b.table_name.to_lowercase())
                .then_with(|| a.table_name.cmp(&b.table_name))
                .then_with(|| column_sort_key(a).cmp(&column_sort_key(b)))
        });
        Ok(columns)
    }
}

#[async_trait]
impl MetadataSource for SnapshotSource {
    async fn fetch_columns(&self) -> Result<Vec<ColumnMetadata>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let columns = Self::parse(&content)?;
        info!(
            "Loaded {} columns from {}",
            columns.len(),
            self.path.display()
        );
        Ok(columns)
    }

    fn describe(&self) -> String {
        format!("snapshot://{}", self.path.display())
    }
}

/// Save catalog rows as a JSON snapshot.
pub fn write_snapshot(path: &Path, columns: &[ColumnMetadata]) -> Result<()> {
    let json = serde_json::to_string_pretty(columns)?;
    std::fs::write(path, json)?;
    info!("Wrote {} columns to {}", columns.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::test_support::{column, identity};
    use crate::error::AuditError;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let columns = vec![
            identity("Driver", "DriverId", "int"),
            column("Driver", "Name", "varchar"),
        ];

        write_snapshot(&path, &columns).unwrap();
        let loaded = SnapshotSource::new(&path).fetch_columns().await.unwrap();
        assert_eq!(loaded, columns);
    }

    #[test]
    fn test_rows_sorted_into_catalog_order() {
        let json = r#"[
            {"schema_name":"dbo","table_name":"Truck","column_name":"Plate","type_name":"varchar",
             "max_length":10,"precision":0,"scale":0,"is_nullable":false,"is_identity":false},
            {"schema_name":"dbo","table_name":"Driver","column_name":"Name","type_name":"varchar",
             "max_length":50,"precision":0,"scale":0,"is_nullable":true,"is_identity":false},
            {"schema_name":"dbo","table_name":"Driver","column_name":"DriverId","type_name":"int",
             "max_length":4,"precision":10,"scale":0,"is_nullable":false,"is_identity":true}
        ]"#;

        let columns = SnapshotSource::parse(json).unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["DriverId", "Name", "Plate"]);
    }

    #[test]
    fn test_mixed_case_names_ignore_case() {
        let columns = vec![
            column("truck", "Plate", "varchar"),
            column("Driver", "name", "varchar"),
            column("Driver", "Badge", "varchar"),
            identity("Driver", "DriverId", "int"),
        ];
        let json = serde_json::to_string(&columns).unwrap();

        let sorted = SnapshotSource::parse(&json).unwrap();
        let names: Vec<_> = sorted.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["DriverId", "Badge", "name", "Plate"]);
    }

    #[test]
    fn test_object_instead_of_array_rejected() {
        let json = r#"{"columns": []}"#;
        let err = SnapshotSource::parse(json).unwrap_err();
        assert!(matches!(err, AuditError::Json(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = SnapshotSource::new("/nonexistent/meta.json");
        let err = source.fetch_columns().await.unwrap_err();
        assert!(matches!(err, AuditError::Io(_)));
    }
}

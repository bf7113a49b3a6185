//! Column metadata sources.
//!
//! [`MssqlSource`] reads the live catalog; [`SnapshotSource`] reads a JSON
//! file written earlier with [`write_snapshot`]. Both return rows ordered by
//! table name, identity columns first, then column name.

mod mssql;
mod snapshot;

pub use mssql::{HealthCheckResult, MssqlSource};
pub use snapshot::{write_snapshot, SnapshotSource};

use async_trait::async_trait;

use crate::core::ColumnMetadata;
use crate::error::Result;

/// Trait for column metadata providers.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Read every column of every candidate table in one request.
    async fn fetch_columns(&self) -> Result<Vec<ColumnMetadata>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// In-memory source, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    columns: Vec<ColumnMetadata>,
}

impl StaticSource {
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }
}

#[async_trait]
impl MetadataSource for StaticSource {
    async fn fetch_columns(&self) -> Result<Vec<ColumnMetadata>> {
        Ok(self.columns.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} columns)", self.columns.len())
    }
}

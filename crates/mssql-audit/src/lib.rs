//! # mssql-audit
//!
//! Audit table and change-capture trigger generator for SQL Server schemas.
//!
//! For each requested table the library produces a T-SQL script that:
//!
//! - **Drops** any existing audit triggers and audit table
//! - **Creates** a `{Table}Audit` shadow table with type, time and principal columns
//! - **Creates** delete, insert and update triggers that populate it
//! - **Suppresses** update rows when nothing changed, including LOB columns
//!
//! Metadata comes from the live catalog or from a JSON snapshot.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mssql_audit::{Config, Generator, MssqlSource};
//!
//! #[tokio::main]
//! async fn main() -> mssql_audit::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let source = config
//!         .source
//!         .clone()
//!         .map(MssqlSource::new)
//!         .ok_or_else(|| mssql_audit::AuditError::Config("no source".into()))?;
//!     let result = Generator::new(config).run(&source).await?;
//!     println!("Generated {} tables", result.tables_generated.len());
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod core;
pub mod ddl;
pub mod emit;
pub mod error;
pub mod generator;
pub mod source;
pub mod typemap;
pub mod validate;

// Re-exports for convenient access
pub use config::{Config, GenerationConfig, InvalidTablePolicy, MissingTablePolicy, SourceConfig};
pub use self::core::{ColumnMetadata, TableAggregate};
pub use ddl::{Dialect, TsqlDialect};
pub use error::{AuditError, Result, ValidationRule};
pub use generator::{GenerationResult, Generator};
pub use source::{write_snapshot, MetadataSource, MssqlSource, SnapshotSource, StaticSource};

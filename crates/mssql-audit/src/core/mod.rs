//! Core metadata types and identifier handling.
//!
//! - [`schema`]: column and table metadata
//! - [`identifier`]: identifier validation and bracket quoting

pub mod identifier;
pub mod schema;

pub use schema::{ColumnMetadata, TableAggregate, UNBOUNDED_LENGTH};

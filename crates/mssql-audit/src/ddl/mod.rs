//! Audit DDL synthesis.
//!
//! - [`ast`]: typed statement nodes
//! - [`synth`]: builds the nodes for one validated table
//! - [`render`]: turns nodes into script text through a [`Dialect`]
//!
//! Per table the script contains, in order: drop triggers, drop audit table
//! (and its index), create audit table, then the delete, insert and update
//! triggers. Every create is guarded by an earlier existence-checked drop, so
//! the script can be applied repeatedly.

pub mod ast;
pub mod render;
pub mod synth;

pub use ast::{Block, Statement, TableScript};
pub use render::{Dialect, TsqlDialect};
pub use synth::{synthesize_table, AuditNames};

//! Generation run coordinator.
//!
//! Reads metadata once, then assembles, validates, synthesizes and renders
//! every requested table before anything is written. A failing run leaves
//! the output untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assemble::assemble_tables;
use crate::config::{Config, InvalidTablePolicy, MissingTablePolicy};
use crate::core::ColumnMetadata;
use crate::ddl::{synthesize_table, Dialect, TsqlDialect};
use crate::emit::{self, OutputTarget};
use crate::error::{AuditError, Result};
use crate::source::MetadataSource;
use crate::validate::validate_table;

/// Generation coordinator.
pub struct Generator {
    config: Config,
    dialect: Box<dyn Dialect>,
}

/// A table left out of the script under the `skip` policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTable {
    pub table: String,
    pub reason: String,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed", or "partial" when tables were skipped.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Where metadata came from.
    pub source: String,

    /// Number of table names requested.
    pub tables_requested: usize,

    /// Tables with audit DDL in the script, as `schema.table`.
    pub tables_generated: Vec<String>,

    /// Tables that failed eligibility and were skipped.
    pub skipped_tables: Vec<SkippedTable>,

    /// Requested tables absent from the catalog.
    pub missing_tables: Vec<String>,

    /// File the script was written to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// Rendered script.
    #[serde(skip)]
    pub script: String,
}

impl GenerationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything produced from one metadata read, before any output.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub script: String,
    pub tables_generated: Vec<String>,
    pub skipped_tables: Vec<SkippedTable>,
    pub missing_tables: Vec<String>,
}

impl Generator {
    /// Create a generator rendering T-SQL.
    pub fn new(config: Config) -> Self {
        Self::with_dialect(config, Box::new(TsqlDialect::new()))
    }

    /// Create a generator with a specific dialect.
    pub fn with_dialect(config: Config, dialect: Box<dyn Dialect>) -> Self {
        Self { config, dialect }
    }

    /// Build the script from catalog rows and apply the table policies.
    pub fn plan(&self, columns: Vec<ColumnMetadata>) -> Result<Plan> {
        let generation = &self.config.generation;
        let assembled = assemble_tables(columns, &generation.tables);

        if !assembled.missing.is_empty() {
            match generation.on_missing_table {
                MissingTablePolicy::Ignore => {
                    debug!("Ignoring missing tables: {}", assembled.missing.join(", "));
                }
                MissingTablePolicy::Warn => {
                    warn!(
                        "Requested tables not found in catalog: {}",
                        assembled.missing.join(", ")
                    );
                }
                MissingTablePolicy::Error => {
                    return Err(AuditError::MissingTables(assembled.missing));
                }
            }
        }

        let mut plan = Plan {
            missing_tables: assembled.missing,
            ..Plan::default()
        };
        let mut scripts = Vec::with_capacity(assembled.tables.len());

        for table in &assembled.tables {
            if let Err(e) = validate_table(table) {
                match generation.on_invalid_table {
                    InvalidTablePolicy::Abort => return Err(e),
                    InvalidTablePolicy::Skip => {
                        warn!("Skipping {}: {}", table.full_name(), e);
                        plan.skipped_tables.push(SkippedTable {
                            table: table.full_name(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                }
            }

            scripts.push(synthesize_table(table)?);
            plan.tables_generated.push(table.full_name());
            debug!(
                "{}: synthesized audit DDL ({} columns, lob: {})",
                table.full_name(),
                table.columns().len(),
                table.has_lob_columns()
            );
        }

        plan.script = emit::render_all(self.dialect.as_ref(), &scripts);
        Ok(plan)
    }

    /// Read metadata from `source` and build the script without writing it.
    pub async fn generate(&self, source: &dyn MetadataSource) -> Result<GenerationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting generation run: {}", run_id);

        info!("Reading column metadata from {}", source.describe());
        let columns = source.fetch_columns().await?;
        info!(
            "Generating audit DDL for {} requested tables ({} dialect)",
            self.config.generation.tables.len(),
            self.dialect.name()
        );
        let plan = self.plan(columns)?;

        if plan.tables_generated.is_empty() {
            warn!("No tables generated; the script is empty");
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let status = if plan.skipped_tables.is_empty() {
            "completed"
        } else {
            "partial"
        };

        let result = GenerationResult {
            run_id,
            status: status.to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            source: source.describe(),
            tables_requested: self.config.generation.tables.len(),
            tables_generated: plan.tables_generated,
            skipped_tables: plan.skipped_tables,
            missing_tables: plan.missing_tables,
            output_path: None,
            script: plan.script,
        };

        info!(
            "Generation {}: {} generated, {} skipped, {} missing in {:.1}s",
            result.status,
            result.tables_generated.len(),
            result.skipped_tables.len(),
            result.missing_tables.len(),
            result.duration_seconds
        );

        Ok(result)
    }

    /// Generate and write the script to the configured output.
    pub async fn run(&self, source: &dyn MetadataSource) -> Result<GenerationResult> {
        let mut result = self.generate(source).await?;
        let target = OutputTarget::from(&self.config.output);
        emit::emit(&result.script, &target)?;
        result.output_path = target.path.map(|p| p.display().to_string());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, OutputConfig};
    use crate::core::schema::test_support::{column, identity, nullable};
    use crate::error::ValidationRule;
    use crate::source::StaticSource;

    fn config(tables: &[&str]) -> Config {
        Config {
            source: None,
            generation: GenerationConfig {
                tables: tables.iter().map(|t| t.to_string()).collect(),
                on_missing_table: MissingTablePolicy::Warn,
                on_invalid_table: InvalidTablePolicy::Abort,
            },
            output: OutputConfig::default(),
        }
    }

    fn catalog() -> Vec<ColumnMetadata> {
        vec![
            // Document has an image column but no identity
            column("Document", "Body", "image"),
            column("Document", "Title", "varchar"),
            identity("Driver", "DriverId", "int"),
            nullable(column("Driver", "Name", "varchar")),
            identity("Truck", "TruckId", "int"),
            column("Truck", "Plate", "varchar"),
        ]
    }

    #[test]
    fn test_plan_only_requested_tables() {
        let generator = Generator::new(config(&["Driver"]));
        let plan = generator.plan(catalog()).unwrap();
        assert_eq!(plan.tables_generated, vec!["dbo.Driver"]);
        assert!(plan.script.contains("[dbo].[DriverAudit]"));
        assert!(!plan.script.contains("Truck"));
    }

    #[test]
    fn test_tables_follow_catalog_order() {
        let generator = Generator::new(config(&["Truck", "Driver"]));
        let plan = generator.plan(catalog()).unwrap();
        assert_eq!(plan.tables_generated, vec!["dbo.Driver", "dbo.Truck"]);
    }

    #[test]
    fn test_missing_table_warn_keeps_going() {
        let generator = Generator::new(config(&["Driver", "Ghost"]));
        let plan = generator.plan(catalog()).unwrap();
        assert_eq!(plan.missing_tables, vec!["Ghost"]);
        assert_eq!(plan.tables_generated.len(), 1);
    }

    #[test]
    fn test_missing_table_error_policy() {
        let mut cfg = config(&["Driver", "Ghost"]);
        cfg.generation.on_missing_table = MissingTablePolicy::Error;
        let err = Generator::new(cfg).plan(catalog()).unwrap_err();
        assert!(matches!(err, AuditError::MissingTables(ref t) if t == &vec!["Ghost".to_string()]));
    }

    #[test]
    fn test_invalid_table_aborts_by_default() {
        let generator = Generator::new(config(&["Driver", "Document"]));
        let err = generator.plan(catalog()).unwrap_err();
        match err {
            AuditError::Validation { table, rule } => {
                assert_eq!(table, "Document");
                assert_eq!(rule, ValidationRule::NoIdentityColumn);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_table_skip_policy() {
        let mut cfg = config(&["Driver", "Document"]);
        cfg.generation.on_invalid_table = InvalidTablePolicy::Skip;
        let plan = Generator::new(cfg).plan(catalog()).unwrap();
        assert_eq!(plan.tables_generated, vec!["dbo.Driver"]);
        assert_eq!(plan.skipped_tables.len(), 1);
        assert_eq!(plan.skipped_tables[0].table, "dbo.Document");
        assert!(!plan.script.contains("Document"));
    }

    #[tokio::test]
    async fn test_generate_result() {
        let source = StaticSource::new(catalog());
        let generator = Generator::new(config(&["Driver", "Ghost"]));
        let result = generator.generate(&source).await.unwrap();

        assert_eq!(result.status, "completed");
        assert_eq!(result.tables_requested, 2);
        assert_eq!(result.missing_tables, vec!["Ghost"]);
        assert!(result.script.starts_with("IF OBJECT_ID('[dbo].[DriverOnDelete]'"));
        assert!(result.output_path.is_none());

        let json = result.to_json().unwrap();
        assert!(json.contains("\"run_id\""));
        assert!(!json.contains("\"script\""));
    }

    #[tokio::test]
    async fn test_run_writes_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.sql");
        let mut cfg = config(&["Truck"]);
        cfg.output.path = Some(path.clone());

        let result = Generator::new(cfg)
            .run(&StaticSource::new(catalog()))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, result.script);
        assert!(written.contains("CREATE TRIGGER [dbo].[TruckOnUpdate]"));
        assert_eq!(result.output_path, Some(path.display().to_string()));
    }

    #[tokio::test]
    async fn test_abort_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.sql");
        let mut cfg = config(&["Driver", "Document"]);
        cfg.output.path = Some(path.clone());

        let err = Generator::new(cfg)
            .run(&StaticSource::new(catalog()))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_VALIDATION_ERROR);
        assert!(!path.exists());
    }
}

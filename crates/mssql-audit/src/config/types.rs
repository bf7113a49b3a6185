//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (MSSQL). Optional when metadata is read
    /// from a snapshot file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,

    /// Which tables to audit and how to treat problem tables.
    pub generation: GenerationConfig,

    /// Where the generated script goes.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Source database (MSSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "mssql").
    #[serde(default = "default_mssql")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 1433).
    #[serde(default = "default_mssql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Restrict the catalog read to one schema. All schemas when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Encrypt connection (default: "true").
    #[serde(default = "default_true_string")]
    pub encrypt: String,

    /// Trust server certificate (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,

    /// Connect timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Generation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Table names to audit (exact, case-sensitive match; schema ignored).
    pub tables: Vec<String>,

    /// What to do when a requested table is not in the catalog (default: warn).
    #[serde(default)]
    pub on_missing_table: MissingTablePolicy,

    /// What to do when a table fails eligibility checks (default: abort).
    #[serde(default)]
    pub on_invalid_table: InvalidTablePolicy,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File to write the script to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Also print the script to stdout when a path is set.
    #[serde(default)]
    pub stdout: bool,
}

/// Policy for requested tables the catalog does not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTablePolicy {
    /// Skip silently.
    Ignore,

    /// Skip and log a warning.
    #[default]
    Warn,

    /// Fail the run.
    Error,
}

/// Policy for tables that fail audit eligibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidTablePolicy {
    /// Fail the run on the first invalid table; nothing is written.
    #[default]
    Abort,

    /// Leave the table out of the script and keep going.
    Skip,
}

// Default value functions for serde
fn default_mssql() -> String {
    "mssql".to_string()
}

fn default_mssql_port() -> u16 {
    1433
}

fn default_true_string() -> String {
    "true".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

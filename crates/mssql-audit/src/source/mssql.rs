//! Catalog read from SQL Server over tiberius.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::ColumnMetadata;
use crate::error::{AuditError, Result};

use super::MetadataSource;

/// One row per column of every user table, excluding existing audit tables.
///
/// Alias types resolve to their base system type. CLR types (`geography`,
/// `geometry`, `hierarchyid`) have no system type row of their own and fall
/// back to the column's user type, so every column is returned.
/// `nchar`/`nvarchar` lengths are stored in bytes and converted to
/// characters here.
const COLUMNS_QUERY: &str = r#"
    SELECT
        s.name AS SchemaName,
        t.name AS TableName,
        c.name AS ColumnName,
        COALESCE(bt.name, ut.name) AS TypeName,
        CAST(CASE
            WHEN COALESCE(bt.name, ut.name) IN ('nchar', 'nvarchar') AND c.max_length > 0
                THEN c.max_length / 2
            ELSE c.max_length
        END AS INT) AS MaxLength,
        CAST(c.precision AS INT) AS Precision,
        CAST(c.scale AS INT) AS Scale,
        CAST(c.is_nullable AS INT) AS IsNullable,
        CAST(c.is_identity AS INT) AS IsIdentity
    FROM sys.all_columns c
    JOIN sys.tables t ON t.object_id = c.object_id
    JOIN sys.schemas s ON s.schema_id = t.schema_id
    JOIN sys.types ut ON ut.user_type_id = c.user_type_id
    LEFT JOIN sys.types bt ON bt.user_type_id = c.system_type_id
    WHERE COALESCE(bt.name, ut.name) NOT IN ('sysname')
      AND t.name NOT LIKE '%Audit'
      AND (@P1 IS NULL OR s.name = @P1)
    ORDER BY t.name, c.is_identity DESC, c.name
"#;

/// Connectivity report for the source database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub healthy: bool,
}

/// MSSQL catalog reader. Opens one connection per request.
pub struct MssqlSource {
    config: SourceConfig,
}

impl MssqlSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port);
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            &self.config.password,
        ));

        if self.config.encryption_enabled() {
            if self.config.trust_server_cert {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        } else {
            config.encryption(EncryptionLevel::NotSupported);
        }

        config
    }

    async fn connect(&self) -> Result<Client<Compat<TcpStream>>> {
        let config = self.build_config();
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);

        let tcp = tokio::time::timeout(timeout, TcpStream::connect(config.get_addr()))
            .await
            .map_err(|_| {
                AuditError::connection(
                    format!("timed out after {}s", timeout.as_secs()),
                    self.config.describe(),
                )
            })?
            .map_err(|e| AuditError::connection(e.to_string(), self.config.describe()))?;

        tcp.set_nodelay(true).ok();

        let client = Client::connect(config, tcp.compat_write()).await?;
        debug!("Connected to MSSQL: {}", self.config.describe());
        Ok(client)
    }

    /// Open a connection and run `SELECT 1`, returning the round-trip time.
    pub async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        let mut client = self.connect().await?;
        client.simple_query("SELECT 1").await?.into_row().await?;
        Ok(started.elapsed())
    }

    /// Check connectivity, reporting failures in the result instead of as errors.
    pub async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = self.ping().await;
        let source_latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(_) => HealthCheckResult {
                source_connected: true,
                source_latency_ms,
                source_error: None,
                healthy: true,
            },
            Err(e) => HealthCheckResult {
                source_connected: false,
                source_latency_ms,
                source_error: Some(e.to_string()),
                healthy: false,
            },
        }
    }
}

#[async_trait]
impl MetadataSource for MssqlSource {
    async fn fetch_columns(&self) -> Result<Vec<ColumnMetadata>> {
        let mut client = self.connect().await?;

        let mut query = Query::new(COLUMNS_QUERY);
        query.bind(self.config.schema.as_deref());

        let stream = query.query(&mut client).await?;
        let rows = stream.into_first_result().await?;

        let columns = rows
            .iter()
            .map(column_from_row)
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Read {} columns from {}",
            columns.len(),
            self.config.describe()
        );
        Ok(columns)
    }

    fn describe(&self) -> String {
        format!("mssql://{}", self.config.describe())
    }
}

fn column_from_row(row: &Row) -> Result<ColumnMetadata> {
    Ok(ColumnMetadata {
        schema_name: get_str(row, 0)?,
        table_name: get_str(row, 1)?,
        column_name: get_str(row, 2)?,
        type_name: get_str(row, 3)?,
        max_length: row.try_get::<i32, _>(4)?.unwrap_or(0),
        precision: row.try_get::<i32, _>(5)?.unwrap_or(0),
        scale: row.try_get::<i32, _>(6)?.unwrap_or(0),
        is_nullable: row.try_get::<i32, _>(7)?.unwrap_or(0) == 1,
        is_identity: row.try_get::<i32, _>(8)?.unwrap_or(0) == 1,
    })
}

fn get_str(row: &Row, idx: usize) -> Result<String> {
    Ok(row
        .try_get::<&str, _>(idx)?
        .unwrap_or_default()
        .to_string())
}

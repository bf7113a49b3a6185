//! mssql-audit CLI - audit tables and triggers for SQL Server schemas.

use clap::{Parser, Subcommand};
use mssql_audit::config::CONFIG_TEMPLATE;
use mssql_audit::{
    write_snapshot, AuditError, Config, Generator, InvalidTablePolicy, MetadataSource,
    MssqlSource, SnapshotSource,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "mssql-audit")]
#[command(about = "Generate audit tables and change-capture triggers for SQL Server")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the audit script
    Generate {
        /// Override the table list (comma separated)
        #[arg(long, value_delimiter = ',')]
        tables: Option<Vec<String>>,

        /// Override source schema
        #[arg(long)]
        schema: Option<String>,

        /// Write the script to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read column metadata from a JSON snapshot instead of the database
        #[arg(long)]
        metadata_file: Option<PathBuf>,

        /// Also print the script to stdout when writing a file
        #[arg(long)]
        stdout: bool,

        /// Skip tables that fail eligibility checks instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Save the source catalog's column metadata as a JSON snapshot
    DumpMetadata {
        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Override source schema
        #[arg(long)]
        schema: Option<String>,
    },

    /// Test the source database connection
    HealthCheck,

    /// Write a starter configuration file
    Init {
        /// Output path for configuration file [default: config.yaml]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force overwrite existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), AuditError> {
    let cli = Cli::parse();

    // Handle init command separately (doesn't need existing config)
    if let Commands::Init { output, force } = cli.command {
        let output_path = output.unwrap_or_else(|| PathBuf::from("config.yaml"));
        return write_config_template(&output_path, force);
    }

    setup_logging(&cli.verbosity, &cli.log_format).map_err(AuditError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above
        Commands::Generate {
            tables,
            schema,
            output,
            metadata_file,
            stdout,
            skip_invalid,
        } => {
            // Apply overrides
            if let Some(tables) = tables {
                config.generation.tables = tables;
            }
            if let Some(schema) = schema {
                override_schema(&mut config, schema)?;
            }
            if let Some(path) = output {
                config.output.path = Some(path);
            }
            if stdout {
                config.output.stdout = true;
            }
            if skip_invalid {
                config.generation.on_invalid_table = InvalidTablePolicy::Skip;
            }
            config.validate()?;

            if cli.output_json && (config.output.stdout || config.output.path.is_none()) {
                return Err(AuditError::Config(
                    "--output-json needs the script written to a file (use --output)".to_string(),
                ));
            }

            let source = select_source(&config, metadata_file)?;
            let result = Generator::new(config).run(source.as_ref()).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            }
        }
        Commands::DumpMetadata { output, schema } => {
            if let Some(schema) = schema {
                override_schema(&mut config, schema)?;
            }
            config.validate()?;

            let source = live_source(&config)?;
            let columns = source.fetch_columns().await?;
            write_snapshot(&output, &columns)?;

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "path": output.display().to_string(),
                        "columns": columns.len(),
                    }))?
                );
            }
        }
        Commands::HealthCheck => {
            let source = live_source(&config)?;
            let result = source.health_check().await;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MSSQL): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }
            if !result.healthy {
                return Err(AuditError::connection(
                    "Health check failed",
                    source.describe(),
                ));
            }
        }
    }

    Ok(())
}

fn override_schema(config: &mut Config, schema: String) -> Result<(), AuditError> {
    match config.source.as_mut() {
        Some(source) => {
            source.schema = Some(schema);
            Ok(())
        }
        None => Err(AuditError::Config(
            "--schema requires a source section in the configuration".to_string(),
        )),
    }
}

fn live_source(config: &Config) -> Result<MssqlSource, AuditError> {
    config
        .source
        .clone()
        .map(MssqlSource::new)
        .ok_or_else(|| {
            AuditError::Config("No source database configured (add a source section)".to_string())
        })
}

fn select_source(
    config: &Config,
    metadata_file: Option<PathBuf>,
) -> Result<Box<dyn MetadataSource>, AuditError> {
    match metadata_file {
        Some(path) => Ok(Box::new(SnapshotSource::new(path))),
        None => Ok(Box::new(live_source(config)?)),
    }
}

fn write_config_template(path: &Path, force: bool) -> Result<(), AuditError> {
    if path.exists() && !force {
        return Err(AuditError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    std::fs::write(path, CONFIG_TEMPLATE)?;
    eprintln!("Wrote starter configuration to {}", path.display());
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Stdout carries the script, so logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

//! Script assembly and persistence.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::OutputConfig;
use crate::ddl::{Dialect, TableScript};
use crate::error::Result;

/// Where a finished script goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: Option<PathBuf>,
    pub stdout: bool,
}

impl OutputTarget {
    /// Stdout is used when no file is configured, or when asked for explicitly.
    pub fn writes_stdout(&self) -> bool {
        self.stdout || self.path.is_none()
    }
}

impl From<&OutputConfig> for OutputTarget {
    fn from(config: &OutputConfig) -> Self {
        Self {
            path: config.path.clone(),
            stdout: config.stdout,
        }
    }
}

/// Concatenate rendered table scripts in order.
pub fn render_all(dialect: &dyn Dialect, scripts: &[TableScript]) -> String {
    scripts.iter().map(|s| dialect.render_script(s)).collect()
}

/// Write `script` to every destination of `target`.
pub fn emit(script: &str, target: &OutputTarget) -> Result<()> {
    if let Some(path) = &target.path {
        write_file(path, script)?;
    }
    if target.writes_stdout() {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(script.as_bytes())?;
        handle.flush()?;
    }
    Ok(())
}

fn write_file(path: &Path, script: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, script)?;
    info!("Wrote {} bytes to {}", script.len(), path.display());
    Ok(())
}

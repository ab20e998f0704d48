//! Per-module log sinks under the dated run directory.
//!
//! Layout: `<installRoot>/<log_dir>/<YYYY-MM-DD>/<stage>/<logFile>`, one log
//! file per executed module. These are product artifacts, written on every
//! run and unaffected by `RUST_LOG`; dev diagnostics go through `tracing`
//! (see `logging`).

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::manifest::Stage;

/// The run's log directory, derived from install root, calendar date, and
/// stage.
#[derive(Debug, Clone)]
pub struct RunLogs {
    pub dir: PathBuf,
}

impl RunLogs {
    pub fn new(install_root: &Path, log_dir: &str, stage: Stage, date: NaiveDate) -> Self {
        let dir = install_root
            .join(log_dir)
            .join(date.format("%Y-%m-%d").to_string())
            .join(stage.as_str());
        Self { dir }
    }

    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create log directory {}", self.dir.display()))
    }

    /// Open (append) the log sink for one module.
    pub fn module_log(&self, file_name: &str) -> Result<ModuleLog> {
        let path = self.dir.join(file_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open module log {}", path.display()))?;
        Ok(ModuleLog {
            path,
            file: Some(file),
        })
    }

    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// A scoped log sink for one module's execution.
///
/// Released on drop on every exit path; close failures are logged and
/// ignored, never escalated. A disabled sink (acquisition failed) swallows
/// lines so phase code never has to branch on log availability.
#[derive(Debug)]
pub struct ModuleLog {
    path: PathBuf,
    file: Option<File>,
}

impl ModuleLog {
    /// A sink that discards lines, used when acquisition fails.
    pub fn disabled(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Write failures are logged and ignored.
    pub fn line(&mut self, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let stamp = Utc::now().format("%H:%M:%S");
        if let Err(err) = writeln!(file, "{stamp} {message}") {
            warn!(path = %self.path.display(), %err, "module log write failed");
        }
    }
}

impl Drop for ModuleLog {
    fn drop(&mut self) {
        if let Some(file) = self.file.take()
            && let Err(err) = file.sync_all()
        {
            warn!(path = %self.path.display(), %err, "module log release failed");
        }
    }
}

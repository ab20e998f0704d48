//! Engine configuration stored at `<installRoot>/upgrade.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Engine configuration (TOML).
///
/// This file is optional and intended to be edited by humans. Missing fields
/// default to the standard install layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory under the install root receiving dated run logs.
    pub log_dir: String,

    /// Property file under the install root holding `version` and `build`.
    pub version_file: String,

    /// File name of the machine-readable run report inside the log directory.
    pub report_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            version_file: "version.properties".to_string(),
            report_file: "report.json".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("log_dir", &self.log_dir),
            ("version_file", &self.version_file),
            ("report_file", &self.report_file),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{field} must be non-empty"));
            }
        }
        if self.report_file.contains('/') || self.report_file.contains('\\') {
            return Err(anyhow!("report_file must not contain path separators"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn load_overrides_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("upgrade.toml");
        fs::write(&path, "log_dir = \"upgrade_logs\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.log_dir, "upgrade_logs");
        assert_eq!(cfg.version_file, "version.properties");
    }

    #[test]
    fn rejects_empty_fields() {
        let cfg = EngineConfig {
            log_dir: " ".to_string(),
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_report_file_with_separators() {
        let cfg = EngineConfig {
            report_file: "../report.json".to_string(),
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

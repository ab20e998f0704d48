//! Phase 3: declared property-file patches.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::io::module_log::ModuleLog;
use crate::io::properties::PropertyFile;
use crate::manifest::{ModuleDefinition, VariableEdit};

/// Result of one variable edit (or of a file-level read/write).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PatchRecord {
    pub file: String,
    pub variable: String,
    pub action: String,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn run_phase(root: &Path, module: &ModuleDefinition, log: &mut ModuleLog) -> Vec<PatchRecord> {
    let mut records = Vec::new();
    for file_edit in &module.property_edits {
        let path = root.join(&file_edit.path);
        let mut props = if path.is_file() {
            match PropertyFile::load(&path) {
                Ok(props) => props,
                Err(err) => {
                    let detail = format!("{err:#}");
                    log.line(&format!("patch {}: {detail}", file_edit.path));
                    warn!(module = %module.id, file = %file_edit.path, %detail, "property file unreadable");
                    records.push(file_record(&file_edit.path, "read", detail));
                    continue;
                }
            }
        } else {
            PropertyFile::default()
        };

        for edit in &file_edit.edits {
            let (applied, detail) = apply_edit(&mut props, edit);
            match &detail {
                Some(detail) => log.line(&format!(
                    "patch {} {} '{}': skipped ({detail})",
                    file_edit.path, edit.action, edit.name
                )),
                None => log.line(&format!(
                    "patch {} {} '{}'",
                    file_edit.path, edit.action, edit.name
                )),
            }
            records.push(PatchRecord {
                file: file_edit.path.clone(),
                variable: edit.name.clone(),
                action: edit.action.clone(),
                applied,
                detail,
            });
        }

        if let Err(err) = write_with_recreate(&props, &path) {
            let detail = format!("{err:#}");
            log.line(&format!("patch {}: {detail}", file_edit.path));
            warn!(module = %module.id, file = %file_edit.path, %detail, "property file write failed");
            records.push(file_record(&file_edit.path, "write", detail));
        }
    }
    records
}

fn apply_edit(props: &mut PropertyFile, edit: &VariableEdit) -> (bool, Option<String>) {
    let value = edit.value.as_deref().unwrap_or("");
    match edit.action.as_str() {
        "delete" => match props.remove(&edit.name) {
            true => (true, None),
            false => (false, Some("key absent".to_string())),
        },
        "add" => {
            if !props.contains(&edit.name) || edit.modify_if_exists {
                props.set(&edit.name, value);
                (true, None)
            } else {
                (false, Some("key already exists".to_string()))
            }
        }
        "modify" => {
            if props.contains(&edit.name) || edit.add_if_not_exists {
                props.set(&edit.name, value);
                (true, None)
            } else {
                (false, Some("key absent".to_string()))
            }
        }
        other => (false, Some(format!("unknown action '{other}'"))),
    }
}

/// Rewrite in place; if that fails, delete and recreate the file, then retry
/// the write once.
fn write_with_recreate(props: &PropertyFile, path: &Path) -> Result<()> {
    let Err(first) = props.write(path) else {
        return Ok(());
    };
    warn!(path = %path.display(), err = %format!("{first:#}"), "rewrite failed, recreating");
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), %err, "remove before recreate failed");
    }
    props
        .write(path)
        .with_context(|| format!("recreate {}", path.display()))
}

fn file_record(file: &str, action: &str, detail: String) -> PatchRecord {
    PatchRecord {
        file: file.to_string(),
        variable: "*".to_string(),
        action: action.to_string(),
        applied: false,
        detail: Some(detail),
    }
}

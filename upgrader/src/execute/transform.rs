//! Phase 1: declared file transforms.
//!
//! The stylesheet engine itself is an external collaborator behind the
//! [`Transformer`] trait; this phase locates target files, invokes the
//! engine, and rewrites each file with the transformed content plus the
//! declared document-type line. One file's failure never stops the
//! remaining files or specs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::warn;

use crate::io::module_log::ModuleLog;
use crate::manifest::{ModuleDefinition, TransformSpec, TransformTarget};

/// The external transform engine's narrow interface.
pub trait Transformer {
    fn transform(&self, source: &str, spec: &TransformSpec) -> Result<String>;
}

/// Built-in engine used when no real one is registered: content passes
/// through unchanged and only the declared doctype is applied on rewrite.
pub struct DoctypePassthrough;

impl Transformer for DoctypePassthrough {
    fn transform(&self, source: &str, _spec: &TransformSpec) -> Result<String> {
        Ok(source.to_string())
    }
}

/// Result of one file transform (or of locating a spec's targets).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransformRecord {
    pub file: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn run_phase(
    root: &Path,
    transformer: &dyn Transformer,
    module: &ModuleDefinition,
    log: &mut ModuleLog,
) -> Vec<TransformRecord> {
    let mut records = Vec::new();
    for spec in &module.transforms {
        let files = match locate(root, &spec.target) {
            Ok(files) => files,
            Err(err) => {
                let detail = format!("{err:#}");
                log.line(&format!("transform {}: {detail}", spec.target));
                warn!(module = %module.id, target = %spec.target, %detail, "transform spec failed");
                records.push(TransformRecord {
                    file: spec.target.to_string(),
                    ok: false,
                    detail: Some(detail),
                });
                continue;
            }
        };
        if files.is_empty() {
            log.line(&format!("transform {}: no files matched", spec.target));
        }
        for file in files {
            let record = match transform_file(transformer, &file, spec) {
                Ok(()) => {
                    log.line(&format!(
                        "transformed {} with {}",
                        file.display(),
                        spec.stylesheet
                    ));
                    TransformRecord {
                        file: file.display().to_string(),
                        ok: true,
                        detail: None,
                    }
                }
                Err(err) => {
                    let detail = format!("{err:#}");
                    log.line(&format!("transform {} failed: {detail}", file.display()));
                    warn!(module = %module.id, file = %file.display(), %detail, "file transform failed");
                    TransformRecord {
                        file: file.display().to_string(),
                        ok: false,
                        detail: Some(detail),
                    }
                }
            };
            records.push(record);
        }
    }
    records
}

/// Resolve a transform target to concrete files. Directory listings are
/// sorted so runs are deterministic.
fn locate(root: &Path, target: &TransformTarget) -> Result<Vec<PathBuf>> {
    match target {
        TransformTarget::File(path) => {
            let path = root.join(path);
            if !path.is_file() {
                bail!("missing file {}", path.display());
            }
            Ok(vec![path])
        }
        TransformTarget::Dir { dir, kind } => {
            let dir = root.join(dir);
            let entries = fs::read_dir(&dir)
                .with_context(|| format!("read directory {}", dir.display()))?;
            let mut files = Vec::new();
            for entry in entries {
                let path = entry
                    .with_context(|| format!("read entry in {}", dir.display()))?
                    .path();
                if path.is_file() && matches_kind(&path, kind.as_deref()) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        }
    }
}

fn matches_kind(path: &Path, kind: Option<&str>) -> bool {
    let Some(kind) = kind else {
        return true;
    };
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(kind))
}

fn transform_file(transformer: &dyn Transformer, path: &Path, spec: &TransformSpec) -> Result<()> {
    let source =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let transformed = transformer
        .transform(&source, spec)
        .with_context(|| format!("apply {}", spec.stylesheet))?;
    let output = match &spec.doctype {
        Some(doctype) => format!("{doctype}\n{transformed}"),
        None => transformed,
    };
    fs::write(path, output).with_context(|| format!("write {}", path.display()))
}

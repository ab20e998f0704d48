//! The machine-readable run report and its stdout summary.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::outcome::{RecordedOutcome, Severity};
use crate::execute::patch::PatchRecord;
use crate::execute::transform::TransformRecord;
use crate::manifest::Stage;

/// Everything one run did, serialized to `report.json` in the run's log
/// directory. Failures live here and in the per-module logs; they never
/// surface as a process exit status.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub stage: Stage,
    pub installed: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_secs: f64,
    pub modules: Vec<ModuleReport>,
    /// Flat per-module/per-plugin outcome list, in execution order.
    pub outcomes: Vec<RecordedOutcome>,
}

#[derive(Debug, Serialize)]
pub struct ModuleReport {
    pub id: String,
    pub log_file: String,
    pub transforms: Vec<TransformRecord>,
    pub patches: Vec<PatchRecord>,
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn severity_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for recorded in &self.outcomes {
            match recorded.outcome.severity {
                Severity::Success => counts.0 += 1,
                Severity::Warning => counts.1 += 1,
                Severity::Exception => counts.2 += 1,
            }
        }
        counts
    }
}

/// Serialize the report to pretty-printed JSON with trailing newline.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(report).context("serialize report")?;
    payload.push('\n');
    std::fs::write(path, payload).with_context(|| format!("write {}", path.display()))
}

/// Print the human summary after a run.
pub fn print_summary(report: &RunReport) {
    let (success, warning, exception) = report.severity_counts();
    println!(
        "run: stage={} installed={} modules={} duration_secs={:.2}",
        report.stage.as_str(),
        report.installed,
        report.modules.len(),
        report.duration_secs
    );
    println!("run: plugin outcomes success={success} warning={warning} exception={exception}");
    for module in &report.modules {
        let transforms_ok = module.transforms.iter().filter(|record| record.ok).count();
        let patches_applied = module.patches.iter().filter(|record| record.applied).count();
        println!(
            "module: id={} log={} transforms={}/{} patches={}/{} errors={}",
            module.id,
            module.log_file,
            transforms_ok,
            module.transforms.len(),
            patches_applied,
            module.patches.len(),
            module.errors.len()
        );
    }
    for recorded in &report.outcomes {
        if recorded.outcome.severity != Severity::Success {
            println!(
                "outcome: module={} plugin={} severity={:?} message={}",
                recorded.module,
                recorded.plugin,
                recorded.outcome.severity,
                recorded.outcome.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::PluginOutcome;

    fn report() -> RunReport {
        RunReport {
            stage: Stage::Preupgrade,
            installed: "5.3.2/100".to_string(),
            started_at: "now".to_string(),
            finished_at: "later".to_string(),
            duration_secs: 1.5,
            modules: Vec::new(),
            outcomes: vec![
                RecordedOutcome {
                    module: "m".to_string(),
                    plugin: "a".to_string(),
                    outcome: PluginOutcome::success("ok"),
                },
                RecordedOutcome {
                    module: "m".to_string(),
                    plugin: "b".to_string(),
                    outcome: PluginOutcome::exception("boom"),
                },
            ],
        }
    }

    #[test]
    fn counts_outcomes_by_severity() {
        assert_eq!(report().severity_counts(), (1, 0, 1));
    }

    #[test]
    fn writes_pretty_json_with_trailing_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("report.json");
        write_report(&path, &report()).expect("write");

        let contents = std::fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&contents).expect("json");
        assert_eq!(value["stage"], "preupgrade");
        assert_eq!(value["outcomes"][1]["severity"], "exception");
    }
}

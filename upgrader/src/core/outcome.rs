//! Per-plugin outcome records and the run-wide outcome log.

use serde::{Deserialize, Serialize};

/// Severity of a single plugin invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Exception,
}

/// Result of one plugin invocation. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginOutcome {
    pub severity: Severity,
    pub message: String,
}

impl PluginOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn exception(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Exception,
            message: message.into(),
        }
    }
}

/// One outcome log entry: which module and plugin produced the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedOutcome {
    pub module: String,
    pub plugin: String,
    #[serde(flatten)]
    pub outcome: PluginOutcome,
}

/// Append-only outcome accumulator for one run.
///
/// Reporting only: the orchestrator never branches on accumulated
/// severities. A fresh log is created per run.
#[derive(Debug, Default)]
pub struct OutcomeLog {
    entries: Vec<RecordedOutcome>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, module: &str, plugin: &str, outcome: PluginOutcome) {
        self.entries.push(RecordedOutcome {
            module: module.to_string(),
            plugin: plugin.to_string(),
            outcome,
        });
    }

    pub fn all(&self) -> &[RecordedOutcome] {
        &self.entries
    }

    pub fn into_all(self) -> Vec<RecordedOutcome> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut log = OutcomeLog::new();
        log.record("mod-a", "first", PluginOutcome::success("ok"));
        log.record("mod-a", "second", PluginOutcome::exception("boom"));
        log.record("mod-b", "first", PluginOutcome::warning("hm"));

        let entries = log.all();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].plugin, "first");
        assert_eq!(entries[1].outcome.severity, Severity::Exception);
        assert_eq!(entries[2].module, "mod-b");
    }

    #[test]
    fn outcome_serializes_flat() {
        let recorded = RecordedOutcome {
            module: "m".to_string(),
            plugin: "p".to_string(),
            outcome: PluginOutcome::success("done"),
        };
        let json = serde_json::to_value(&recorded).expect("serialize");
        assert_eq!(json["severity"], "success");
        assert_eq!(json["message"], "done");
        assert_eq!(json["module"], "m");
    }
}

//! The execution orchestrator.
//!
//! Runs the selected modules sequentially, each through three fixed phases:
//! file transforms, the plugin chain, then property-file patches. Every
//! phase, file, and plugin is its own unit of failure; the loop records the
//! result and continues, so the run always completes. Nothing here branches
//! on accumulated severities.

pub mod patch;
pub mod transform;

use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use crate::core::outcome::{OutcomeLog, PluginOutcome};
use crate::core::version::Version;
use crate::io::module_log::{ModuleLog, RunLogs};
use crate::manifest::{Manifest, ModuleDefinition};
use crate::plugins::{PluginContext, Registry};
use crate::report::{ModuleReport, RunReport};
use crate::select::SelectionPlan;
use self::transform::{DoctypePassthrough, Transformer};

/// The run's external collaborators: the plugin registry and the transform
/// engine. Embedders register real plugins and engines; the defaults are an
/// empty registry and the doctype-only passthrough.
pub struct Runtime {
    pub registry: Registry,
    pub transformer: Box<dyn Transformer>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
            transformer: Box::new(DoctypePassthrough),
        }
    }
}

/// Immutable per-run state shared by every module. Built once at run start;
/// there is no ambient global state.
pub struct RunContext<'a> {
    pub install_root: &'a Path,
    pub installed: Version,
    pub runtime: &'a Runtime,
}

/// Execute the plan in order. Single pass, sequential, no backtracking; the
/// report is the only output that matters to callers.
pub fn run(
    ctx: &RunContext<'_>,
    manifest: &Manifest,
    plan: &SelectionPlan,
    logs: &RunLogs,
) -> RunReport {
    let started_at = Utc::now();
    // Fresh per run: outcomes never leak across runs.
    let mut outcomes = OutcomeLog::new();
    let mut modules = Vec::with_capacity(plan.selected.len());

    for &index in &plan.selected {
        let module = &manifest.modules[index];
        info!(module = %module.id, "executing module");
        modules.push(execute_module(ctx, module, &mut outcomes, logs));
    }

    let finished_at = Utc::now();
    RunReport {
        stage: manifest.stage,
        installed: ctx.installed.to_string(),
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        duration_secs: (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
        modules,
        outcomes: outcomes.into_all(),
    }
}

fn execute_module(
    ctx: &RunContext<'_>,
    module: &ModuleDefinition,
    outcomes: &mut OutcomeLog,
    logs: &RunLogs,
) -> ModuleReport {
    let mut report = ModuleReport {
        id: module.id.clone(),
        log_file: module.log_file.clone(),
        transforms: Vec::new(),
        patches: Vec::new(),
        errors: Vec::new(),
    };

    // The sink is scoped to this function: dropped (and flushed) on every
    // exit path. A failed acquisition degrades to a discarding sink so the
    // module still runs.
    let mut log = match logs.module_log(&module.log_file) {
        Ok(log) => log,
        Err(err) => {
            let detail = format!("{err:#}");
            warn!(module = %module.id, %detail, "module log unavailable");
            report.errors.push(format!("module log unavailable: {detail}"));
            ModuleLog::disabled(logs.dir.join(&module.log_file))
        }
    };
    log.line(&format!(
        "module {} started (installed {})",
        module.id, ctx.installed
    ));

    report.transforms = transform::run_phase(
        ctx.install_root,
        ctx.runtime.transformer.as_ref(),
        module,
        &mut log,
    );
    run_plugin_chain(ctx, module, outcomes, &mut log);
    report.patches = patch::run_phase(ctx.install_root, module, &mut log);

    log.line(&format!("module {} finished", module.id));
    report
}

/// Phase 2: run each declared plugin in order. A plugin error becomes an
/// exception-severity outcome and the chain moves on.
fn run_plugin_chain(
    ctx: &RunContext<'_>,
    module: &ModuleDefinition,
    outcomes: &mut OutcomeLog,
    log: &mut ModuleLog,
) {
    for spec in &module.plugins {
        let outcome = match ctx.runtime.registry.instantiate(&spec.id) {
            Some(plugin) => {
                let plugin_ctx = PluginContext {
                    install_root: ctx.install_root,
                    module_id: &module.id,
                    installed: ctx.installed,
                };
                match plugin.process(&plugin_ctx, &spec.params) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        log.line(&format!("plugin {} raised: {err:?}", spec.id));
                        warn!(module = %module.id, plugin = %spec.id, "plugin raised an error");
                        PluginOutcome::exception(format!("{err:#}"))
                    }
                }
            }
            // Unreachable after the fail-fast registry check at startup.
            None => PluginOutcome::exception(format!("plugin '{}' not registered", spec.id)),
        };
        log.line(&format!(
            "plugin {}: {:?} {}",
            spec.id, outcome.severity, outcome.message
        ));
        outcomes.record(&module.id, &spec.id, outcome);
    }
}

//! Upgrade engine CLI.
//!
//! `run` performs an in-place upgrade of the install tree named by its
//! arguments; per-module failures are logged and reported, never turned
//! into a non-zero exit. Only catastrophic startup errors (unreadable
//! manifest, missing version metadata, unknown plugin id) abort the run.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use upgrader::execute::{self, RunContext, Runtime};
use upgrader::io::config::load_config;
use upgrader::io::install::read_installed_version;
use upgrader::io::module_log::RunLogs;
use upgrader::logging;
use upgrader::manifest::Manifest;
use upgrader::report::{print_summary, write_report};
use upgrader::select::{Verdict, select_modules};

const CONFIG_FILE: &str = "upgrade.toml";

#[derive(Parser)]
#[command(name = "upgrader", version, about = "In-place product upgrade engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select applicable modules and execute them.
    Run {
        install_root: PathBuf,
        manifest: PathBuf,
    },
    /// Print selection decisions without executing anything.
    Plan {
        install_root: PathBuf,
        manifest: PathBuf,
    },
    /// Check a manifest's structure and report findings.
    Validate { manifest: PathBuf },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            install_root,
            manifest,
        } => cmd_run(&install_root, &manifest),
        Command::Plan {
            install_root,
            manifest,
        } => cmd_plan(&install_root, &manifest),
        Command::Validate { manifest } => cmd_validate(&manifest),
    }
}

fn cmd_run(install_root: &Path, manifest_path: &Path) -> Result<()> {
    let config = load_config(&install_root.join(CONFIG_FILE))?;
    let installed = read_installed_version(install_root, &config.version_file)?;
    let manifest = Manifest::load(manifest_path)?;

    let runtime = Runtime::default();
    runtime.registry.check_manifest(&manifest)?;

    info!(%installed, stage = manifest.stage.as_str(), "starting run");
    let plan = select_modules(&manifest, installed, install_root);

    let logs = RunLogs::new(
        install_root,
        &config.log_dir,
        manifest.stage,
        Utc::now().date_naive(),
    );
    logs.create()?;

    let ctx = RunContext {
        install_root,
        installed,
        runtime: &runtime,
    };
    let report = execute::run(&ctx, &manifest, &plan, &logs);

    write_report(&logs.report_path(&config.report_file), &report)?;
    print_summary(&report);
    Ok(())
}

fn cmd_plan(install_root: &Path, manifest_path: &Path) -> Result<()> {
    let config = load_config(&install_root.join(CONFIG_FILE))?;
    let installed = read_installed_version(install_root, &config.version_file)?;
    let manifest = Manifest::load(manifest_path)?;

    let plan = select_modules(&manifest, installed, install_root);
    println!(
        "plan: stage={} installed={} selected={}/{}",
        manifest.stage.as_str(),
        installed,
        plan.selected.len(),
        plan.decisions.len()
    );
    for decision in &plan.decisions {
        match &decision.verdict {
            Verdict::Selected => println!("plan: module={} selected", decision.module_id),
            other => println!("plan: module={} skip ({other})", decision.module_id),
        }
    }
    Ok(())
}

fn cmd_validate(manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    println!(
        "validate: ok stage={} modules={}",
        manifest.stage.as_str(),
        manifest.modules.len()
    );
    for finding in manifest.lint() {
        println!("validate: warning {finding}");
    }
    Ok(())
}

//! The plugin seam: externally supplied units of upgrade work.
//!
//! The manifest carries plugin identifiers; the registry maps each
//! identifier to a factory and resolves them when the plan is built, so an
//! unknown identifier fails the run up front instead of mid-chain.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};

use crate::core::outcome::PluginOutcome;
use crate::core::version::Version;
use crate::manifest::Manifest;

/// Read-only run state handed to every plugin invocation.
#[derive(Debug, Clone, Copy)]
pub struct PluginContext<'a> {
    pub install_root: &'a Path,
    pub module_id: &'a str,
    pub installed: Version,
}

/// One externally supplied unit of upgrade work.
///
/// `process` returns the invocation's outcome, or an error; either way the
/// chain continues with the next plugin.
pub trait Plugin {
    fn process(
        &self,
        ctx: &PluginContext<'_>,
        params: &BTreeMap<String, String>,
    ) -> Result<PluginOutcome>;
}

type Factory = Box<dyn Fn() -> Box<dyn Plugin>>;

/// Identifier-to-factory registry for plugins.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Construct the plugin registered under `id`.
    pub fn instantiate(&self, id: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(id).map(|factory| factory())
    }

    /// Fail fast: every plugin identifier the manifest names must be
    /// registered before any module executes.
    pub fn check_manifest(&self, manifest: &Manifest) -> Result<()> {
        for module in &manifest.modules {
            for spec in &module.plugins {
                if !self.contains(&spec.id) {
                    bail!(
                        "unknown plugin id '{}' in module '{}'",
                        spec.id,
                        module.id
                    );
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! Module selection: version gate plus environment predicates.
//!
//! The plan is computed once, before any module executes, and never
//! re-evaluated mid-run even when a module's own side effects would change
//! an answer.

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::core::gate;
use crate::core::version::{Version, VersionRange};
use crate::io::predicate::evaluate;
use crate::manifest::{Manifest, ModuleDefinition, Predicate};

/// Why a module was or was not selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Selected,
    /// Version range failed to parse; the module is skipped, selection of
    /// the remaining modules continues.
    BadRange(String),
    VersionOutOfRange,
    /// The first failing predicate, rendered for the report.
    PredicateFailed(String),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selected => f.write_str("selected"),
            Self::BadRange(reason) => write!(f, "bad version range: {reason}"),
            Self::VersionOutOfRange => f.write_str("installed version out of range"),
            Self::PredicateFailed(predicate) => write!(f, "predicate failed: {predicate}"),
        }
    }
}

/// One decision per manifest module, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecision {
    pub module_id: String,
    pub verdict: Verdict,
}

/// The run's definitive execution plan.
#[derive(Debug, Clone)]
pub struct SelectionPlan {
    /// Decisions in manifest order, one per declared module.
    pub decisions: Vec<ModuleDecision>,
    /// Indices into the manifest's module list, order preserved, duplicates
    /// kept if the manifest declares them.
    pub selected: Vec<usize>,
}

/// Gate every manifest module against the installed version and the
/// filesystem state under `root`.
pub fn select_modules(manifest: &Manifest, installed: Version, root: &Path) -> SelectionPlan {
    let mut decisions = Vec::with_capacity(manifest.modules.len());
    let mut selected = Vec::new();

    for (index, module) in manifest.modules.iter().enumerate() {
        let verdict = gate_module(module, installed, root);
        match &verdict {
            Verdict::Selected => {
                info!(module = %module.id, "module selected");
                selected.push(index);
            }
            other => {
                info!(module = %module.id, verdict = %other, "module skipped");
            }
        }
        decisions.push(ModuleDecision {
            module_id: module.id.clone(),
            verdict,
        });
    }

    SelectionPlan {
        decisions,
        selected,
    }
}

fn gate_module(module: &ModuleDefinition, installed: Version, root: &Path) -> Verdict {
    let range = match VersionRange::parse(&module.range) {
        Ok(range) => range,
        Err(err) => return Verdict::BadRange(err.to_string()),
    };
    if !gate::applies(installed, &range) {
        return Verdict::VersionOutOfRange;
    }

    // Property predicates first, then XML queries, each chain short-circuiting.
    for predicate in property_predicates(module).chain(xpath_predicates(module)) {
        if !evaluate(predicate, root) {
            debug!(module = %module.id, %predicate, "predicate failed");
            return Verdict::PredicateFailed(predicate.to_string());
        }
    }
    Verdict::Selected
}

fn property_predicates(module: &ModuleDefinition) -> impl Iterator<Item = &Predicate> {
    module
        .predicates
        .iter()
        .filter(|predicate| matches!(predicate, Predicate::Property(_)))
}

fn xpath_predicates(module: &ModuleDefinition) -> impl Iterator<Item = &Predicate> {
    module
        .predicates
        .iter()
        .filter(|predicate| matches!(predicate, Predicate::XPath(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MANIFEST: &str = r#"<upgrade>
  <module id="in-range">
    <from major="5" minor="0"/>
    <to major="6" minor="0"/>
  </module>
  <module id="out-of-range">
    <from major="7" minor="0"/>
    <to major="8" minor="0"/>
  </module>
  <module id="bad-range">
    <from major="five" minor="0"/>
    <to major="6" minor="0"/>
  </module>
  <module id="gated">
    <from major="5" minor="0"/>
    <to major="6" minor="0"/>
    <propertyMatch filePath="config/server.properties" name="flag"
                   operator="==" compareTo="yes"/>
  </module>
</upgrade>"#;

    fn installed() -> Version {
        Version::new(5, 3, 2, 100)
    }

    #[test]
    fn selection_preserves_manifest_order_and_skips_by_reason() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("config")).expect("mkdir");
        fs::write(
            temp.path().join("config/server.properties"),
            "flag=no\n",
        )
        .expect("write");

        let manifest = Manifest::parse(MANIFEST).expect("parse");
        let plan = select_modules(&manifest, installed(), temp.path());

        assert_eq!(plan.selected, vec![0]);
        assert_eq!(plan.decisions.len(), 4);
        assert_eq!(plan.decisions[0].verdict, Verdict::Selected);
        assert_eq!(plan.decisions[1].verdict, Verdict::VersionOutOfRange);
        assert!(matches!(plan.decisions[2].verdict, Verdict::BadRange(_)));
        assert!(matches!(
            plan.decisions[3].verdict,
            Verdict::PredicateFailed(_)
        ));
    }

    #[test]
    fn passing_predicates_select_the_module() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("config")).expect("mkdir");
        fs::write(
            temp.path().join("config/server.properties"),
            "flag=YES\n",
        )
        .expect("write");

        let manifest = Manifest::parse(MANIFEST).expect("parse");
        let plan = select_modules(&manifest, installed(), temp.path());
        assert_eq!(plan.selected, vec![0, 3]);
    }

    #[test]
    fn selection_is_idempotent_for_a_fixed_snapshot() {
        let temp = tempfile::tempdir().expect("tempdir");
        let manifest = Manifest::parse(MANIFEST).expect("parse");

        let first = select_modules(&manifest, installed(), temp.path());
        let second = select_modules(&manifest, installed(), temp.path());
        assert_eq!(first.selected, second.selected);
        assert_eq!(first.decisions, second.decisions);
    }
}

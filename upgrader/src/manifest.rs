//! The declarative upgrade manifest.
//!
//! Loaded once at run start and read-only afterwards. Version-range bounds
//! are kept as raw strings here; the selector parses them per module so a
//! malformed range skips one module instead of failing the load.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use roxmltree::{Document, Node};
use serde::Serialize;
use tracing::debug;

use crate::core::compare::Operator;
use crate::core::version::RawVersionRange;

/// Which half of the upgrade this manifest belongs to. Picks the log
/// subdirectory for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Preupgrade,
    Postupgrade,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preupgrade => "preupgrade",
            Self::Postupgrade => "postupgrade",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "preupgrade" => Some(Self::Preupgrade),
            "postupgrade" => Some(Self::Postupgrade),
            _ => None,
        }
    }
}

/// A parsed manifest: stage plus modules in declaration order.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub stage: Stage,
    pub modules: Vec<ModuleDefinition>,
}

/// One declared upgrade module. Never mutated after load.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    pub id: String,
    pub log_file: String,
    pub range: RawVersionRange,
    pub predicates: Vec<Predicate>,
    pub transforms: Vec<TransformSpec>,
    pub plugins: Vec<PluginSpec>,
    pub property_edits: Vec<PropertyFileEdit>,
}

/// An environment gate beyond the version range.
#[derive(Debug, Clone)]
pub enum Predicate {
    Property(PropertyMatch),
    XPath(XPathMatch),
}

impl Predicate {
    pub fn operator(&self) -> Operator {
        match self {
            Self::Property(matcher) => matcher.operator,
            Self::XPath(matcher) => matcher.operator,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(matcher) => {
                write!(f, "propertyMatch {}", matcher.file_path)?;
                if let Some(field) = &matcher.field {
                    write!(f, " {field}")?;
                }
                write!(f, " {}", matcher.operator)?;
                if let Some(value) = &matcher.compare_to {
                    write!(f, " {value}")?;
                }
                Ok(())
            }
            Self::XPath(matcher) => {
                write!(
                    f,
                    "XPathMatch {} {} {}",
                    matcher.file_path, matcher.query, matcher.operator
                )?;
                if let Some(value) = &matcher.compare_to {
                    write!(f, " {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Key lookup (or bare existence check) against a flat property file.
#[derive(Debug, Clone)]
pub struct PropertyMatch {
    pub file_path: String,
    /// Absent = plain file-existence predicate.
    pub field: Option<String>,
    pub operator: Operator,
    pub compare_to: Option<String>,
    pub case_sensitive: bool,
}

/// Value extraction from an XML file via a path query.
#[derive(Debug, Clone)]
pub struct XPathMatch {
    pub file_path: String,
    pub query: String,
    pub operator: Operator,
    pub compare_to: Option<String>,
    pub case_sensitive: bool,
}

/// One declared file-transform unit of work.
#[derive(Debug, Clone)]
pub struct TransformSpec {
    pub target: TransformTarget,
    pub stylesheet: String,
    /// Prepended to the transformed output on rewrite.
    pub doctype: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TransformTarget {
    /// A single file, relative to the install root.
    File(String),
    /// All files directly inside a directory, optionally filtered by
    /// extension.
    Dir { dir: String, kind: Option<String> },
}

impl fmt::Display for TransformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{path}"),
            Self::Dir { dir, kind: None } => write!(f, "{dir}/*"),
            Self::Dir {
                dir,
                kind: Some(kind),
            } => write!(f, "{dir}/*.{kind}"),
        }
    }
}

/// One link in the module's plugin chain.
#[derive(Debug, Clone)]
pub struct PluginSpec {
    pub id: String,
    pub params: BTreeMap<String, String>,
}

/// All variable edits declared for one property file.
#[derive(Debug, Clone)]
pub struct PropertyFileEdit {
    pub path: String,
    pub edits: Vec<VariableEdit>,
}

/// One property-file variable edit.
///
/// `action` stays a raw string: unknown actions are logged and skipped at
/// execution time, they do not fail the load.
#[derive(Debug, Clone)]
pub struct VariableEdit {
    pub name: String,
    pub value: Option<String>,
    pub action: String,
    pub modify_if_exists: bool,
    pub add_if_not_exists: bool,
}

impl Manifest {
    /// Load and parse a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parse manifest {}", path.display()))
    }

    /// Parse manifest XML.
    pub fn parse(contents: &str) -> Result<Self> {
        let doc = Document::parse(contents).context("parse manifest xml")?;
        let root = doc.root_element();
        if !root.has_tag_name("upgrade") {
            bail!(
                "manifest root must be <upgrade>, found <{}>",
                root.tag_name().name()
            );
        }

        let stage = match root.attribute("stage") {
            Some(value) => Stage::parse(value)
                .with_context(|| format!("unknown stage '{value}' on <upgrade>"))?,
            None => Stage::Preupgrade,
        };

        let mut modules = Vec::new();
        for node in root.children().filter(Node::is_element) {
            if !node.has_tag_name("module") {
                debug!(element = node.tag_name().name(), "ignoring unknown manifest element");
                continue;
            }
            modules.push(parse_module(node)?);
        }

        Ok(Self { stage, modules })
    }

    /// Non-fatal structural findings, reported by `upgrader validate`.
    pub fn lint(&self) -> Vec<String> {
        let mut findings = Vec::new();
        let mut seen = BTreeMap::new();
        for module in &self.modules {
            *seen.entry(module.id.as_str()).or_insert(0u32) += 1;
        }
        for (id, count) in seen {
            if count > 1 {
                findings.push(format!("module id '{id}' declared {count} times"));
            }
        }
        for module in &self.modules {
            if module.transforms.is_empty()
                && module.plugins.is_empty()
                && module.property_edits.is_empty()
            {
                findings.push(format!("module '{}' declares no work", module.id));
            }
        }
        findings
    }
}

fn parse_module(node: Node<'_, '_>) -> Result<ModuleDefinition> {
    let id = require_attr(node, "id")?.to_string();
    let log_file = node
        .attribute("logFile")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{id}.log"));

    let mut module = ModuleDefinition {
        id: id.clone(),
        log_file,
        range: RawVersionRange::default(),
        predicates: Vec::new(),
        transforms: Vec::new(),
        plugins: Vec::new(),
        property_edits: Vec::new(),
    };

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "from" => {
                module.range.from_major = attr(child, "major");
                module.range.from_minor = attr(child, "minor");
                module.range.from_micro = attr(child, "micro");
                module.range.from_build = attr(child, "build");
            }
            "to" => {
                module.range.to_major = attr(child, "major");
                module.range.to_minor = attr(child, "minor");
                module.range.to_micro = attr(child, "micro");
                module.range.to_build = attr(child, "build");
            }
            "propertyMatch" => module
                .predicates
                .push(Predicate::Property(parse_property_match(child, &id)?)),
            "XPathMatch" => module
                .predicates
                .push(Predicate::XPath(parse_xpath_match(child, &id)?)),
            "transformFiles" => module.transforms.push(parse_transform(child, &id)?),
            "plugin" => module.plugins.push(parse_plugin(child, &id)?),
            "propertyFile" => module.property_edits.push(parse_property_file(child, &id)?),
            other => {
                debug!(module = %id, element = other, "ignoring unknown module element");
            }
        }
    }

    Ok(module)
}

fn parse_property_match(node: Node<'_, '_>, module: &str) -> Result<PropertyMatch> {
    Ok(PropertyMatch {
        file_path: require_module_attr(node, "filePath", module)?.to_string(),
        field: attr(node, "name"),
        operator: parse_operator(node, module)?,
        compare_to: attr(node, "compareTo"),
        case_sensitive: flag(node.attribute("caseSensitive")),
    })
}

fn parse_xpath_match(node: Node<'_, '_>, module: &str) -> Result<XPathMatch> {
    Ok(XPathMatch {
        file_path: require_module_attr(node, "filePath", module)?.to_string(),
        query: require_module_attr(node, "XPathExpression", module)?.to_string(),
        operator: parse_operator(node, module)?,
        compare_to: attr(node, "compareTo"),
        case_sensitive: flag(node.attribute("caseSensitive")),
    })
}

fn parse_transform(node: Node<'_, '_>, module: &str) -> Result<TransformSpec> {
    let target = match (node.attribute("path"), node.attribute("dir")) {
        (Some(path), None) => TransformTarget::File(path.to_string()),
        (None, Some(dir)) => TransformTarget::Dir {
            dir: dir.to_string(),
            kind: attr(node, "kind"),
        },
        (Some(_), Some(_)) => {
            bail!("module '{module}': <transformFiles> declares both path and dir")
        }
        (None, None) => {
            bail!("module '{module}': <transformFiles> declares neither path nor dir")
        }
    };
    Ok(TransformSpec {
        target,
        stylesheet: require_module_attr(node, "stylesheet", module)?.to_string(),
        doctype: attr(node, "doctype").filter(|doctype| !doctype.is_empty()),
    })
}

fn parse_plugin(node: Node<'_, '_>, module: &str) -> Result<PluginSpec> {
    let id = require_module_attr(node, "id", module)?.to_string();
    let mut params = BTreeMap::new();
    for child in node.children().filter(Node::is_element) {
        if !child.has_tag_name("param") {
            continue;
        }
        let name = require_module_attr(child, "name", module)?.to_string();
        let value = require_module_attr(child, "value", module)?.to_string();
        params.insert(name, value);
    }
    Ok(PluginSpec { id, params })
}

fn parse_property_file(node: Node<'_, '_>, module: &str) -> Result<PropertyFileEdit> {
    let path = require_module_attr(node, "path", module)?.to_string();
    let mut edits = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if !child.has_tag_name("variable") {
            continue;
        }
        edits.push(VariableEdit {
            name: require_module_attr(child, "name", module)?.to_string(),
            value: attr(child, "value"),
            action: require_module_attr(child, "action", module)?.to_string(),
            modify_if_exists: flag(child.attribute("modifyIfExists")),
            add_if_not_exists: flag(child.attribute("addIfNotExists")),
        });
    }
    Ok(PropertyFileEdit { path, edits })
}

fn parse_operator(node: Node<'_, '_>, module: &str) -> Result<Operator> {
    let value = require_module_attr(node, "operator", module)?;
    Operator::parse(value).with_context(|| {
        format!(
            "module '{module}': unknown operator '{value}' on <{}>",
            node.tag_name().name()
        )
    })
}

fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

fn require_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    match node.attribute(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!(
            "<{}> requires a non-empty {name} attribute",
            node.tag_name().name()
        ),
    }
}

fn require_module_attr<'a>(node: Node<'a, '_>, name: &str, module: &str) -> Result<&'a str> {
    require_attr(node, name).with_context(|| format!("in module '{module}'"))
}

/// Manifest boolean attributes: `yes` or `true`, case-insensitive.
fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true"))
}

//! Environment predicate evaluation against an install root.
//!
//! The public entry point never propagates an error: an I/O or query failure
//! resolves to the operator's negative result (true for the negating
//! operators `null` and `!=`, false otherwise) with a logged warning. The
//! failure itself stays distinguishable internally via [`evaluate_raw`].

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::core::compare::is_match;
use crate::io::properties::PropertyFile;
use crate::io::xml_query::{self, QueryError};
use crate::manifest::{Predicate, PropertyMatch, XPathMatch};

/// Why a predicate could not be evaluated to a clean boolean.
#[derive(Debug, Error)]
pub enum EvalFailure {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("query {path}: {source}")]
    Query {
        path: PathBuf,
        #[source]
        source: QueryError,
    },
}

/// Evaluate a predicate against the install root. Never fails: evaluation
/// failures degrade to the operator's negative result.
pub fn evaluate(predicate: &Predicate, root: &Path) -> bool {
    match evaluate_raw(predicate, root) {
        Ok(result) => result,
        Err(failure) => {
            let fallback = predicate.operator().is_negating();
            warn!(%failure, fallback, "predicate evaluation failed");
            fallback
        }
    }
}

/// Evaluate a predicate, surfacing evaluation failures to the caller.
pub fn evaluate_raw(predicate: &Predicate, root: &Path) -> Result<bool, EvalFailure> {
    match predicate {
        Predicate::Property(matcher) => evaluate_property(matcher, root),
        Predicate::XPath(matcher) => evaluate_xpath(matcher, root),
    }
}

fn evaluate_property(matcher: &PropertyMatch, root: &Path) -> Result<bool, EvalFailure> {
    let path = root.join(&matcher.file_path);
    let exists = path.is_file();
    let negating = matcher.operator.is_negating();

    // Without a field name the predicate tests bare file existence.
    let Some(field) = matcher.field.as_deref() else {
        return Ok(exists != negating);
    };
    if !exists {
        return Ok(negating);
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| EvalFailure::Read {
        path: path.clone(),
        source,
    })?;
    let props = PropertyFile::parse(&contents);
    Ok(is_match(
        props.get(field),
        matcher.operator,
        matcher.compare_to.as_deref(),
        matcher.case_sensitive,
    ))
}

fn evaluate_xpath(matcher: &XPathMatch, root: &Path) -> Result<bool, EvalFailure> {
    let path = root.join(&matcher.file_path);
    if !path.is_file() {
        return Ok(matcher.operator.is_negating());
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| EvalFailure::Read {
        path: path.clone(),
        source,
    })?;
    let value = xml_query::query_value(&contents, &matcher.query)
        .map_err(|source| EvalFailure::Query {
            path: path.clone(),
            source,
        })?
        .map(|value| xml_query::normalize(&value));
    Ok(is_match(
        value.as_deref(),
        matcher.operator,
        matcher.compare_to.as_deref(),
        matcher.case_sensitive,
    ))
}

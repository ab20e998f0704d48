//! Value extraction from XML files via a small path-query subset.
//!
//! Supported queries: `/root/child/leaf` selects the first matching
//! element's text content; a trailing `/@attr` selects an attribute value.
//! Anything else is a query error, which predicate evaluation resolves to
//! the operator's negative result.

use roxmltree::Document;
use thiserror::Error;

/// Typed failure for XML value queries.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("parse xml: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("unsupported query '{0}'")]
    Unsupported(String),
}

/// Evaluate `query` against `contents`, returning the extracted value or
/// `None` if no node matches.
pub fn query_value(contents: &str, query: &str) -> Result<Option<String>, QueryError> {
    let (segments, attribute) = split_query(query)?;
    let doc = Document::parse(contents)?;

    let mut node = doc.root_element();
    let mut segments = segments.into_iter();
    match segments.next() {
        Some(first) if node.has_tag_name(first) => {}
        Some(_) => return Ok(None),
        None => return Err(QueryError::Unsupported(query.to_string())),
    }
    for segment in segments {
        match node
            .children()
            .find(|child| child.is_element() && child.has_tag_name(segment))
        {
            Some(child) => node = child,
            None => return Ok(None),
        }
    }

    match attribute {
        Some(name) => Ok(node.attribute(name).map(str::to_string)),
        None => {
            let text: String = node
                .descendants()
                .filter(|descendant| descendant.is_text())
                .filter_map(|descendant| descendant.text())
                .collect();
            Ok(Some(text))
        }
    }
}

/// Collapse line breaks and tabs to spaces and trim, so multi-line element
/// content compares like a plain attribute value.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn split_query(query: &str) -> Result<(Vec<&str>, Option<&str>), QueryError> {
    let trimmed = query.trim();
    let body = trimmed
        .strip_prefix('/')
        .ok_or_else(|| QueryError::Unsupported(query.to_string()))?;
    if body.is_empty() {
        return Err(QueryError::Unsupported(query.to_string()));
    }

    let mut segments = Vec::new();
    let mut attribute = None;
    let parts: Vec<&str> = body.split('/').collect();
    for (index, part) in parts.iter().enumerate() {
        if let Some(name) = part.strip_prefix('@') {
            if index != parts.len() - 1 || name.is_empty() {
                return Err(QueryError::Unsupported(query.to_string()));
            }
            attribute = Some(name);
        } else if part.is_empty() || !is_plain_name(part) {
            return Err(QueryError::Unsupported(query.to_string()));
        } else {
            segments.push(*part);
        }
    }
    if segments.is_empty() {
        return Err(QueryError::Unsupported(query.to_string()));
    }
    Ok((segments, attribute))
}

fn is_plain_name(part: &str) -> bool {
    part.chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':'))
}

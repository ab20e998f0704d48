//! Flat `key=value` property files.
//!
//! The reader keeps comment and blank lines and pair order, so a patched
//! file rewrites with only the intended edits visible in a diff.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// An in-memory property file, line-addressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFile {
    lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Pair { key: String, value: String },
    /// Comment, blank, or otherwise non-pair line, carried through verbatim.
    Raw(String),
}

impl PropertyFile {
    /// Load a property file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Parse file contents. Lines starting with `#` or `!` and lines without
    /// an `=` are kept verbatim; everything else splits at the first `=`.
    pub fn parse(contents: &str) -> Self {
        let lines = contents
            .lines()
            .map(|line| {
                let trimmed = line.trim_start();
                if trimmed.starts_with('#') || trimmed.starts_with('!') {
                    return Line::Raw(line.to_string());
                }
                match line.split_once('=') {
                    Some((key, value)) => Line::Pair {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                    },
                    None => Line::Raw(line.to_string()),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Overwrite the first pair with this key, or append a new pair.
    pub fn set(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let Line::Pair { key: k, value: v } = line
                && k == key
            {
                *v = value.to_string();
                return;
            }
        }
        self.lines.push(Line::Pair {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Remove every pair with this key. Returns true if anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| !matches!(line, Line::Pair { key: k, .. } if k == key));
        self.lines.len() != before
    }

    /// Render back to file contents, trailing newline included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Pair { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                Line::Raw(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).with_context(|| format!("write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# server settings\n\
                          cache.size=1024\n\
                          \n\
                          ! legacy block\n\
                          legacy.mode = on\n";

    #[test]
    fn parses_pairs_and_keeps_raw_lines() {
        let props = PropertyFile::parse(SAMPLE);
        assert_eq!(props.get("cache.size"), Some("1024"));
        assert_eq!(props.get("legacy.mode"), Some("on"));
        assert_eq!(props.get("missing"), None);
    }

    #[test]
    fn render_preserves_comments_blanks_and_order() {
        let props = PropertyFile::parse(SAMPLE);
        let rendered = props.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "# server settings");
        assert_eq!(lines[1], "cache.size=1024");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "! legacy block");
        assert_eq!(lines[4], "legacy.mode=on");
    }

    #[test]
    fn set_overwrites_in_place_and_appends_new_keys() {
        let mut props = PropertyFile::parse(SAMPLE);
        props.set("cache.size", "2048");
        props.set("fresh.key", "yes");

        let rendered = props.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "cache.size=2048");
        assert_eq!(lines.last(), Some(&"fresh.key=yes"));
    }

    #[test]
    fn remove_deletes_pair_lines_only() {
        let mut props = PropertyFile::parse(SAMPLE);
        assert!(props.remove("legacy.mode"));
        assert!(!props.remove("legacy.mode"));
        let rendered = props.render();
        assert!(!rendered.contains("legacy.mode"));
        assert!(rendered.contains("! legacy block"));
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("server.properties");
        let props = PropertyFile::parse(SAMPLE);
        props.write(&path).expect("write");
        let loaded = PropertyFile::load(&path).expect("load");
        assert_eq!(loaded.get("cache.size"), Some("1024"));
    }
}

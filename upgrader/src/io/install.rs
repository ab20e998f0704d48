//! Installed-version metadata probe.
//!
//! The installed version is read once at run start; a missing or
//! unparseable version file is a catastrophic startup error that aborts the
//! run before any module executes.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::core::version::Version;
use crate::io::properties::PropertyFile;

/// Read the installed version from `<root>/<version_file>`.
///
/// The file is a flat property file with a required `version` key
/// (`major.minor[.micro]`) and an optional integer `build` key (default 0).
pub fn read_installed_version(root: &Path, version_file: &str) -> Result<Version> {
    let path = root.join(version_file);
    let props = PropertyFile::load(&path).context("read installed version metadata")?;

    let release = props
        .get("version")
        .ok_or_else(|| anyhow!("missing 'version' key in {}", path.display()))?;
    let build = match props.get("build") {
        Some(build) => build
            .parse()
            .with_context(|| format!("invalid 'build' value '{build}' in {}", path.display()))?,
        None => 0,
    };

    Version::parse(release, build)
        .with_context(|| format!("invalid 'version' value '{release}' in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_version_and_build() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            temp.path().join("version.properties"),
            "version=5.3.2\nbuild=100\n",
        )
        .expect("write");

        let version = read_installed_version(temp.path(), "version.properties").expect("read");
        assert_eq!(version, Version::new(5, 3, 2, 100));
    }

    #[test]
    fn missing_build_defaults_to_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("version.properties"), "version=6.0\n").expect("write");

        let version = read_installed_version(temp.path(), "version.properties").expect("read");
        assert_eq!(version, Version::new(6, 0, 0, 0));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = read_installed_version(temp.path(), "version.properties")
            .expect_err("missing metadata");
        assert!(err.to_string().contains("installed version metadata"));
    }

    #[test]
    fn malformed_version_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("version.properties"), "version=six\n").expect("write");
        let err =
            read_installed_version(temp.path(), "version.properties").expect_err("bad version");
        assert!(err.to_string().contains("invalid 'version'"));
    }
}

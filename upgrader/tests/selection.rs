//! End-to-end selection over a realistic install tree.

use std::fs;
use std::path::Path;

use upgrader::io::install::read_installed_version;
use upgrader::manifest::Manifest;
use upgrader::select::{Verdict, select_modules};

const MANIFEST: &str = r#"<upgrade stage="preupgrade">
  <module id="schema-60">
    <from major="5" minor="0" micro="0" build="-1"/>
    <to major="6" minor="0" build="-1"/>
  </module>
  <module id="workgroup-only">
    <from major="5" minor="0"/>
    <to major="6" minor="0"/>
    <XPathMatch filePath="config/app.xml" XPathExpression="/app/edition"
                operator="!=" compareTo="express"/>
  </module>
  <module id="flagged">
    <from major="5" minor="0"/>
    <to major="6" minor="0"/>
    <propertyMatch filePath="config/server.properties" name="upgrade.flag"
                   operator="==" compareTo="yes"/>
  </module>
  <module id="future-only">
    <from major="7" minor="0"/>
    <to major="9" minor="0"/>
  </module>
</upgrade>"#;

fn install_tree(root: &Path, edition: &str, flag: &str) {
    fs::create_dir_all(root.join("config")).expect("mkdir");
    fs::write(root.join("version.properties"), "version=5.3.2\nbuild=100\n").expect("version");
    fs::write(
        root.join("config/app.xml"),
        format!("<app><edition>{edition}</edition></app>"),
    )
    .expect("app.xml");
    fs::write(
        root.join("config/server.properties"),
        format!("upgrade.flag={flag}\n"),
    )
    .expect("server.properties");
}

#[test]
fn selects_by_version_and_predicates_in_manifest_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    install_tree(temp.path(), "workgroup", "YES");

    let manifest = Manifest::parse(MANIFEST).expect("parse");
    let installed = read_installed_version(temp.path(), "version.properties").expect("version");
    let plan = select_modules(&manifest, installed, temp.path());

    let selected: Vec<&str> = plan
        .selected
        .iter()
        .map(|&index| manifest.modules[index].id.as_str())
        .collect();
    assert_eq!(selected, vec!["schema-60", "workgroup-only", "flagged"]);
    assert_eq!(plan.decisions[3].verdict, Verdict::VersionOutOfRange);
}

#[test]
fn express_edition_defeats_the_xpath_gate() {
    let temp = tempfile::tempdir().expect("tempdir");
    install_tree(temp.path(), "express", "no");

    let manifest = Manifest::parse(MANIFEST).expect("parse");
    let installed = read_installed_version(temp.path(), "version.properties").expect("version");
    let plan = select_modules(&manifest, installed, temp.path());

    let selected: Vec<&str> = plan
        .selected
        .iter()
        .map(|&index| manifest.modules[index].id.as_str())
        .collect();
    assert_eq!(selected, vec!["schema-60"]);
    assert!(matches!(plan.decisions[1].verdict, Verdict::PredicateFailed(_)));
    assert!(matches!(plan.decisions[2].verdict, Verdict::PredicateFailed(_)));
}

#[test]
fn selection_is_stable_across_repeated_evaluation() {
    let temp = tempfile::tempdir().expect("tempdir");
    install_tree(temp.path(), "workgroup", "yes");

    let manifest = Manifest::parse(MANIFEST).expect("parse");
    let installed = read_installed_version(temp.path(), "version.properties").expect("version");

    let first = select_modules(&manifest, installed, temp.path());
    let second = select_modules(&manifest, installed, temp.path());
    assert_eq!(first.selected, second.selected);
    assert_eq!(first.decisions, second.decisions);
}

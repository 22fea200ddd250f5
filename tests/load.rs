// Chargement d'un répertoire OpenControl sur disque.

use std::fs;
use std::path::Path;

use opencontrol::load::{load, load_into, LoadSummary};
use opencontrol::{find_component, find_control, Database, Error};

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn datadir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "standards/NIST-800-53.yaml",
        "name: NIST-800-53\n\
         AC-1:\n  family: AC\n  name: Access Control Policy\n  description: Policy text\n\
         AU-1:\n  family: AU\n  name: Audit Policy\n",
    );
    write(
        root,
        "certifications/FedRAMP-low.yaml",
        "name: FedRAMP-low\nstandards:\n  NIST-800-53:\n    AC-1: {}\n    AU-1:\n",
    );
    write(
        root,
        "components/AU_policy/component.yaml",
        "name: Audit Policy\n\
         satisfies:\n\
         - standard_key: NIST-800-53\n  control_key: AU-1\n  narrative:\n  - text: We keep logs.\n",
    );
    write(root, "components/README.md", "not a component");
    dir
}

#[test]
fn loads_a_data_directory() {
    let dir = datadir();
    let mut db = Database::new();
    let summary = load_into(&mut db, dir.path()).unwrap();
    assert_eq!(
        summary,
        LoadSummary { standards: 1, certifications: 1, components: 1 }
    );

    // Clé de composant déduite du répertoire
    let page = find_component(&db, "AU_policy").unwrap();
    assert_eq!(page.satisfies.len(), 1);
    assert_eq!(
        page.satisfies[0].satisfaction.narrative.parts(),
        vec![(None, "We keep logs.")]
    );

    let control = find_control(&db, "NIST-800-53", "AC-1").unwrap();
    assert_eq!(control.control.description, "Policy text");
    assert_eq!(control.certifications.len(), 1);
}

#[test]
fn loads_plain_text_narrative() {
    let dir = datadir();
    write(
        dir.path(),
        "components/AC_policy/component.yaml",
        "name: Access Policy\n\
         satisfies:\n\
         - standard_key: NIST-800-53\n  control_key: AC-1\n  narrative: Access is reviewed.\n",
    );
    let db = load(dir.path()).unwrap();
    assert_eq!(db.components().len(), 2);

    let page = find_component(&db, "AC_policy").unwrap();
    assert_eq!(
        page.satisfies[0].satisfaction.narrative.parts(),
        vec![(None, "Access is reviewed.")]
    );
}

#[test]
fn malformed_standard_aborts_load() {
    let dir = datadir();
    write(dir.path(), "standards/broken.yaml", "AC-9:\n  family: AC\n  name: no standard name\n");
    let err = load(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Yaml { .. }), "got {}", err);
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
fn invalid_yaml_reports_path() {
    let dir = datadir();
    write(dir.path(), "certifications/bad.yml", "name: [unclosed\n");
    let err = load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("bad.yml"));
}

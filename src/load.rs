// =============================================================================
// LOAD — Lecture d'un répertoire OpenControl
// =============================================================================
//
// Disposition attendue (celle de compliance-masonry) :
//
//   opencontrols/
//     standards/       NIST-800-53.yaml, PCI.yaml ...
//     certifications/  FedRAMP-low.yaml ...
//     components/
//       AU_policy/component.yaml
//       AC_policy/component.yaml
//
// Les fichiers sont lus dans l'ordre trié des chemins, pour un résultat
// déterministe. Un répertoire absent est simplement vide. Une clé de
// composant absente est déduite du nom de son répertoire.
//
// Le chargement s'arrête à la première erreur ; ce qui a déjà été
// ingéré reste dans la Database.
//
// =============================================================================

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::core::{CertificationDef, Component, Database, StandardDef};
use crate::error::{Error, Result};

/// Ce qui a été lu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub standards: usize,
    pub certifications: usize,
    pub components: usize,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} standards, {} certifications, {} components",
            self.standards, self.certifications, self.components
        )
    }
}

/// Charge un répertoire dans une Database neuve.
pub fn load(datadir: &Path) -> Result<Database> {
    let mut db = Database::new();
    load_into(&mut db, datadir)?;
    Ok(db)
}

pub fn load_into(db: &mut Database, datadir: &Path) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();

    for path in yaml_files(&datadir.join("standards"))? {
        let standard: StandardDef = read_yaml(&path)?;
        db.add_standard(&standard)?;
        summary.standards += 1;
    }

    for path in yaml_files(&datadir.join("certifications"))? {
        let certification: CertificationDef = read_yaml(&path)?;
        db.add_certification(&certification)?;
        summary.certifications += 1;
    }

    for (dir_name, path) in component_files(&datadir.join("components"))? {
        let mut component: Component = read_yaml(&path)?;
        if component.key.trim().is_empty() {
            component.key = dir_name;
        }
        db.add_component(component)?;
        summary.components += 1;
    }

    info!("Loaded {} from {}", summary, datadir.display());
    Ok(summary)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("reading {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Les entrées triées d'un répertoire ; un répertoire absent est vide.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("no directory {}", dir.display());
        return Ok(Vec::new());
    }
    let io_err = |source| Error::Io { path: dir.to_path_buf(), source };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    paths.sort();
    Ok(paths)
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_yaml(p))
        .collect())
}

/// (nom du répertoire, chemin de component.yaml) pour chaque composant.
fn component_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for sub in sorted_entries(dir)?.into_iter().filter(|p| p.is_dir()) {
        let Some(name) = sub.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let file = ["component.yaml", "component.yml"]
            .iter()
            .map(|f| sub.join(f))
            .find(|p| p.is_file());
        match file {
            Some(path) => found.push((name.to_string(), path)),
            None => debug!("no component file in {}", sub.display()),
        }
    }
    Ok(found)
}

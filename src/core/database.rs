// =============================================================================
// DATABASE — Le bac de rangement des données OpenControl
// =============================================================================
//
// La Database possède ses quatre collections :
//
//   components     clé (key)
//   controls       clé (standard_key, key)
//   certifications sans clé
//   satisfactions  sans clé
//
// Elle est écrite une fois (ingestion), puis lue autant qu'on veut
// (requêtes, sitemap). Les accesseurs ne rendent que des références
// partagées : une fois l'ingestion finie, rien ne peut plus la modifier.
//
// L'ingestion N'EST PAS atomique : si un ajout échoue en cours de route,
// ce qui a déjà été inséré reste en place. Les références croisées
// (satisfaction → contrôle, certification → contrôle) ne sont pas
// vérifiées à l'écriture.
//
// =============================================================================

use tracing::debug;

use super::collection::Collection;
use super::model::{
    Certification, CertificationDef, Component, Control, Satisfaction, StandardDef,
};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Database {
    components: Collection<Component>,
    controls: Collection<Control>,
    certifications: Collection<Certification>,
    satisfactions: Collection<Satisfaction>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        // La vraie clé serait (system_key, key), mais les données existantes
        // utilisent peu `system` et les clés de composants sont déjà uniques.
        Database {
            components: Collection::keyed("components", &["key"]),
            controls: Collection::keyed("controls", &["standard_key", "key"]),
            certifications: Collection::new("certifications"),
            satisfactions: Collection::new("satisfactions"),
        }
    }

    pub fn components(&self) -> &Collection<Component> {
        &self.components
    }

    pub fn controls(&self) -> &Collection<Control> {
        &self.controls
    }

    pub fn certifications(&self) -> &Collection<Certification> {
        &self.certifications
    }

    pub fn satisfactions(&self) -> &Collection<Satisfaction> {
        &self.satisfactions
    }

    /// Ajoute un composant et synthétise une Satisfaction par revendication.
    ///
    /// Un composant ré-ingéré remplace le précédent, et ses anciennes
    /// satisfactions sont retirées avant l'ajout des nouvelles.
    pub fn add_component(&mut self, component: Component) -> Result<()> {
        debug!("... Found component: {}", component.key);
        let sats: Vec<Satisfaction> = component
            .satisfies
            .iter()
            .map(|claim| Satisfaction::from_claim(&component, claim))
            .collect();

        if let Some(old) = self.components.add(component)? {
            let dropped = self.satisfactions.retain(|s| s.component_key != old.key);
            debug!("... replaced component {}, dropped {} satisfactions", old.key, dropped);
        }
        for sat in sats {
            self.satisfactions.add(sat)?;
        }
        Ok(())
    }

    /// Ajoute tous les contrôles d'un standard.
    ///
    /// La définition est lue, jamais modifiée : `name` devient le
    /// standard_key de chaque contrôle et n'est pas lui-même un contrôle.
    pub fn add_standard(&mut self, standard: &StandardDef) -> Result<()> {
        debug!("Found standard: {}", standard.name);
        for (key, body) in &standard.controls {
            self.add_control(Control::from_body(&standard.name, key, body))?;
        }
        Ok(())
    }

    pub fn add_control(&mut self, control: Control) -> Result<()> {
        debug!(" ... Found control: {}/{}", control.standard_key, control.key);
        self.controls.add(control)?;
        Ok(())
    }

    /// Aplatit une certification en une ligne par paire (standard, contrôle).
    pub fn add_certification(&mut self, certification: &CertificationDef) -> Result<()> {
        debug!("... Found certification: {}", certification.name);
        for (standard, controls) in &certification.standards {
            for control in controls {
                debug!("...control: {} {} {}", certification.name, standard, control);
                self.certifications.add(Certification {
                    certification: certification.name.clone(),
                    standard_key: standard.clone(),
                    control_key: control.clone(),
                })?;
            }
        }
        Ok(())
    }

    /// Nombre total de lignes dans les quatre tables.
    pub fn total_rows(&self) -> usize {
        self.components.len()
            + self.controls.len()
            + self.certifications.len()
            + self.satisfactions.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ControlBody, SatisfactionClaim};
    use crate::error::Error;
    use serde_json::json;

    fn nist() -> StandardDef {
        StandardDef::from_value(&json!({
            "name": "NIST-800-53",
            "AC-1": { "family": "AC", "name": "Access Control Policy" },
            "AC-2": { "family": "AC", "name": "Account Management" },
            "AU-1": { "family": "AU", "name": "Audit Policy" }
        }))
        .unwrap()
    }

    #[test]
    fn test_add_component_roundtrip() {
        let mut db = Database::new();
        let comp = Component::new("AU_policy", "Audit Policy")
            .satisfying(SatisfactionClaim::new("NIST-800-53", "AU-1"));
        db.add_component(comp.clone()).unwrap();
        assert_eq!(db.components().find_by_key(["AU_policy"]), Some(&comp));
    }

    #[test]
    fn test_claims_become_satisfactions() {
        let mut db = Database::new();
        let comp = Component::new("AC_policy", "Access Policy")
            .with_system("sys")
            .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-1"))
            .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-2"))
            .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-2"));
        db.add_component(comp).unwrap();

        assert_eq!(db.satisfactions().len(), 3);
        assert!(db
            .satisfactions()
            .iter()
            .all(|s| s.component_key == "AC_policy" && s.system_key.as_deref() == Some("sys")));
    }

    #[test]
    fn test_add_standard() {
        let mut db = Database::new();
        let standard = nist();
        db.add_standard(&standard).unwrap();

        assert_eq!(db.controls().len(), 3);
        for key in ["AC-1", "AC-2", "AU-1"] {
            assert!(db.controls().find_by_key(["NIST-800-53", key]).is_some());
        }
        // `name` n'est pas un contrôle
        assert!(db.controls().find_by_key(["NIST-800-53", "name"]).is_none());
        assert!(db.controls().iter().all(|c| c.key != "NIST-800-53"));
        // La définition est intacte
        assert_eq!(standard, nist());
    }

    #[test]
    fn test_duplicate_control_last_write_wins() {
        let mut db = Database::new();
        db.add_standard(&nist()).unwrap();

        let mut again = StandardDef::new("NIST-800-53");
        again.add_control("AC-2", ControlBody::new("AC", "Account Management (rev 5)"));
        db.add_standard(&again).unwrap();

        assert_eq!(db.controls().len(), 3);
        let c = db.controls().find_by_key(["NIST-800-53", "AC-2"]).unwrap();
        assert_eq!(c.name, "Account Management (rev 5)");
        assert_eq!(db.controls().records()[1].key, "AC-2");
    }

    #[test]
    fn test_duplicate_component_last_write_wins() {
        let mut db = Database::new();
        db.add_component(Component::new("X", "first")).unwrap();
        db.add_component(Component::new("X", "second")).unwrap();
        assert_eq!(db.components().len(), 1);
        assert_eq!(db.components().find_by_key(["X"]).unwrap().name, "second");
    }

    #[test]
    fn test_reingested_component_replaces_its_satisfactions() {
        let mut db = Database::new();
        db.add_component(
            Component::new("Y", "other").satisfying(SatisfactionClaim::new("NIST-800-53", "AC-1")),
        )
        .unwrap();
        db.add_component(
            Component::new("X", "first")
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-1"))
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-2")),
        )
        .unwrap();
        db.add_component(
            Component::new("X", "second")
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AU-1").with_narrative("v2")),
        )
        .unwrap();

        let of_x: Vec<&str> = db
            .satisfactions()
            .iter()
            .filter(|s| s.component_key == "X")
            .map(|s| s.control_key.as_str())
            .collect();
        assert_eq!(of_x, vec!["AU-1"]);
        // Les satisfactions des autres composants ne bougent pas
        assert_eq!(db.satisfactions().len(), 2);
        assert_eq!(db.satisfactions().records()[0].component_key, "Y");
    }

    #[test]
    fn test_add_certification_flattens() {
        let mut db = Database::new();
        let mut cert = CertificationDef::new("FedRAMP-low");
        cert.add_standard("NIST-800-53", &["AC-1", "AU-1"])
            .add_standard("PCI", &["1.1"]);
        db.add_certification(&cert).unwrap();

        let rows: Vec<(String, String)> = db
            .certifications()
            .iter()
            .map(|c| (c.standard_key.clone(), c.control_key.clone()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("NIST-800-53".into(), "AC-1".into()),
                ("NIST-800-53".into(), "AU-1".into()),
                ("PCI".into(), "1.1".into()),
            ]
        );
        assert!(db.certifications().iter().all(|c| c.certification == "FedRAMP-low"));
    }

    #[test]
    fn test_blank_component_key_rejected() {
        let mut db = Database::new();
        let comp = Component::new("", "nameless")
            .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-1"));
        let err = db.add_component(comp).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
        assert!(db.components().is_empty());
        assert!(db.satisfactions().is_empty());
    }

    #[test]
    fn test_ingestion_is_not_atomic() {
        let mut db = Database::new();
        let mut standard = StandardDef::new("S");
        standard.add_control("A", ControlBody::new("F", "ok"))
            .add_control("", ControlBody::new("F", "blank key"))
            .add_control("C", ControlBody::new("F", "never reached"));
        assert!(db.add_standard(&standard).is_err());
        assert_eq!(db.controls().len(), 1);
    }
}

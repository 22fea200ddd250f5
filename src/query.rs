// =============================================================================
// QUERY — Les jointures prêtes pour une page
// =============================================================================
//
// Deux lectures composent les lookups de la Database :
//
//   find_control(db, "NIST-800-53", "AC-1")
//     → le contrôle
//     → ses satisfactions (triées par component_key), chacune peuplée
//       avec son contrôle et son composant
//     → les lignes de certification qui le couvrent
//
//   find_component(db, "AU_policy")
//     → le composant
//     → ses satisfactions (triées par (standard_key, control_key)), peuplées
//
// Seule l'entité RACINE demandée échoue bruyamment (NotFound). Une
// satisfaction qui pointe vers un contrôle ou un composant absent donne
// simplement un champ `None` : les jeux de données de conformité sont
// souvent édités dans le désordre ou incomplets.
//
// Tout est emprunté à la Database : aucune copie, aucune écriture.
//
// =============================================================================

use serde::Serialize;

use crate::core::{Certification, Component, Control, Database, Satisfaction};
use crate::error::{EntityKind, Error, Result};

/// Une satisfaction avec ses références résolues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopulatedSatisfaction<'a> {
    #[serde(flatten)]
    pub satisfaction: &'a Satisfaction,
    pub control: Option<&'a Control>,
    pub component: Option<&'a Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPage<'a> {
    pub control: &'a Control,
    pub satisfied: Vec<PopulatedSatisfaction<'a>>,
    pub certifications: Vec<&'a Certification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentPage<'a> {
    pub component: &'a Component,
    pub satisfies: Vec<PopulatedSatisfaction<'a>>,
}

/// Résout le contrôle et le composant d'une satisfaction.
pub fn populate_satisfaction<'a>(
    db: &'a Database,
    satisfaction: &'a Satisfaction,
) -> PopulatedSatisfaction<'a> {
    PopulatedSatisfaction {
        satisfaction,
        control: db
            .controls()
            .find_by_key([&satisfaction.standard_key, &satisfaction.control_key]),
        component: db.components().find_by_key([&satisfaction.component_key]),
    }
}

pub fn find_control<'a>(
    db: &'a Database,
    standard_key: &str,
    control_key: &str,
) -> Result<ControlPage<'a>> {
    let control = db
        .controls()
        .find_by_key([standard_key, control_key])
        .ok_or_else(|| {
            Error::not_found(EntityKind::Control, format!("{}/{}", standard_key, control_key))
        })?;

    let satisfied = db
        .satisfactions()
        .chain()
        .filter_eq(&[("standard_key", standard_key.into()), ("control_key", control_key.into())])
        .sort_by_fields(&["component_key"])
        .map(|sat| populate_satisfaction(db, sat))
        .value();

    let certifications = db
        .certifications()
        .chain()
        .filter_eq(&[("standard_key", standard_key.into()), ("control_key", control_key.into())])
        .value();

    Ok(ControlPage { control, satisfied, certifications })
}

pub fn find_component<'a>(db: &'a Database, component_key: &str) -> Result<ComponentPage<'a>> {
    let component = db
        .components()
        .find_by_key([component_key])
        .ok_or_else(|| Error::not_found(EntityKind::Component, component_key))?;

    let satisfies = db
        .satisfactions()
        .chain()
        .filter_eq(&[("component_key", component_key.into())])
        .sort_by_fields(&["standard_key", "control_key"])
        .map(|sat| populate_satisfaction(db, sat))
        .value();

    Ok(ComponentPage { component, satisfies })
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CertificationDef, SatisfactionClaim, StandardDef};
    use serde_json::json;

    fn fixture() -> Database {
        let mut db = Database::new();
        db.add_standard(
            &StandardDef::from_value(&json!({
                "name": "NIST-800-53",
                "AC-1": { "family": "AC", "name": "Access Control Policy" },
                "AC-2": { "family": "AC", "name": "Account Management" },
                "AU-1": { "family": "AU", "name": "Audit Policy" }
            }))
            .unwrap(),
        )
        .unwrap();

        // Insérés dans le désordre exprès
        db.add_component(
            Component::new("Zeta", "Zeta service")
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AU-1"))
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-2"))
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-1")),
        )
        .unwrap();
        db.add_component(
            Component::new("Alpha", "Alpha service")
                .satisfying(SatisfactionClaim::new("NIST-800-53", "AC-2"))
                // Référence pendante : ce contrôle n'existe pas
                .satisfying(SatisfactionClaim::new("NIST-800-53", "ZZ-9")),
        )
        .unwrap();

        let mut cert = CertificationDef::new("FedRAMP-low");
        cert.add_standard("NIST-800-53", &["AC-2", "AU-1"]);
        db.add_certification(&cert).unwrap();
        db
    }

    #[test]
    fn test_find_control_sorted_by_component() {
        let db = fixture();
        let page = find_control(&db, "NIST-800-53", "AC-2").unwrap();
        assert_eq!(page.control.name, "Account Management");

        let comps: Vec<&str> = page
            .satisfied
            .iter()
            .map(|s| s.satisfaction.component_key.as_str())
            .collect();
        assert_eq!(comps, vec!["Alpha", "Zeta"]);
        assert!(page.satisfied.iter().all(|s| s.control == Some(page.control)));
        assert_eq!(page.satisfied[0].component.map(|c| c.name.as_str()), Some("Alpha service"));

        assert_eq!(page.certifications.len(), 1);
        assert_eq!(page.certifications[0].certification, "FedRAMP-low");
    }

    #[test]
    fn test_find_control_missing_is_not_found() {
        let db = fixture();
        let err = find_control(&db, "NIST-800-53", "XX-1").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: EntityKind::Control, .. }));
        assert!(err.to_string().contains("NIST-800-53/XX-1"));
    }

    #[test]
    fn test_find_control_without_claims_is_empty() {
        let mut db = Database::new();
        db.add_standard(
            &StandardDef::from_value(&json!({
                "name": "NIST-800-53",
                "AC-1": { "family": "AC", "name": "Access Control Policy" }
            }))
            .unwrap(),
        )
        .unwrap();
        let page = find_control(&db, "NIST-800-53", "AC-1").unwrap();
        assert_eq!(page.control.name, "Access Control Policy");
        assert!(page.satisfied.is_empty());
        assert!(page.certifications.is_empty());
    }

    #[test]
    fn test_find_component_sorted_by_standard_and_control() {
        let db = fixture();
        let page = find_component(&db, "Zeta").unwrap();
        let keys: Vec<&str> = page
            .satisfies
            .iter()
            .map(|s| s.satisfaction.control_key.as_str())
            .collect();
        assert_eq!(keys, vec!["AC-1", "AC-2", "AU-1"]);
    }

    #[test]
    fn test_dangling_reference_degrades_to_none() {
        let db = fixture();
        let page = find_component(&db, "Alpha").unwrap();
        assert_eq!(page.satisfies.len(), 2);
        let dangling = &page.satisfies[1];
        assert_eq!(dangling.satisfaction.control_key, "ZZ-9");
        assert!(dangling.control.is_none());
        assert_eq!(dangling.component.map(|c| c.key.as_str()), Some("Alpha"));
    }

    #[test]
    fn test_find_component_missing() {
        let db = fixture();
        let err = find_component(&db, "XX-Policy").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: EntityKind::Component, .. }));
    }

    #[test]
    fn test_pages_serialize() {
        let db = fixture();
        let page = find_control(&db, "NIST-800-53", "AU-1").unwrap();
        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["control"]["key"], "AU-1");
        assert_eq!(v["satisfied"][0]["component_key"], "Zeta");
        assert_eq!(v["satisfied"][0]["component"]["name"], "Zeta service");
    }
}

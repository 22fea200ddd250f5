// =============================================================================
// LINKS — Les chemins canoniques des entités
// =============================================================================
//
// Un seul endroit construit les URLs : le sitemap et les pages les
// partagent, ce qui garantit que le lien d'une page et sa place dans
// la navigation sont toujours le même chemin.
//
//   component("AU_policy")                     → /components/AU_policy
//   standard("NIST-800-53")                    → /standards/NIST-800-53
//   control("NIST-800-53", "AC-1")             → /standards/NIST-800-53/AC-1
//   family("NIST-800-53", "AC")                → /family/NIST-800-53/AC
//   certification("FedRAMP low")               → /certifications/FedRAMP%20low
//
// Chaque segment est encodé séparément : un "/" dans une clé ne crée
// jamais un niveau de chemin supplémentaire.
//
// =============================================================================

use crate::core::{Component, Control};

/// Construit un chemin d'application à partir de segments bruts.
pub fn appurl<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let encoded: Vec<String> = segments
        .into_iter()
        .map(|s| urlencoding::encode(s.as_ref()).into_owned())
        .collect();
    format!("/{}", encoded.join("/"))
}

pub fn components() -> String {
    appurl(["components"])
}

pub fn standards() -> String {
    appurl(["standards"])
}

pub fn certifications() -> String {
    appurl(["certifications"])
}

pub fn component(key: &str) -> String {
    appurl(["components", key])
}

pub fn standard(standard_key: &str) -> String {
    appurl(["standards", standard_key])
}

pub fn control(standard_key: &str, control_key: &str) -> String {
    appurl(["standards", standard_key, control_key])
}

pub fn family(standard_key: &str, family: &str) -> String {
    appurl(["family", standard_key, family])
}

pub fn certification(name: &str) -> String {
    appurl(["certifications", name])
}

/// Le groupe (standard, famille) à l'intérieur d'une certification.
pub fn certification_group(name: &str, stdfamily: &str) -> String {
    appurl(["certifications", name, stdfamily])
}

/// Un contrôle vu depuis une certification.
pub fn certification_control(name: &str, standard_key: &str, control_key: &str) -> String {
    appurl(["certifications", name, standard_key, control_key])
}

pub fn component_of(component: &Component) -> String {
    self::component(&component.key)
}

pub fn control_of(control: &Control) -> String {
    self::control(&control.standard_key, &control.key)
}

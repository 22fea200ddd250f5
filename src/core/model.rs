// =============================================================================
// MODEL — Les entités OpenControl
// =============================================================================
//
// Quatre tables, quatre types de lignes :
//
//   Component     clé : key                    (un système qui se dit conforme)
//   Control       clé : (standard_key, key)    (une exigence d'un standard)
//   Certification sans clé                     (baseline → paires standard/contrôle)
//   Satisfaction  sans clé                     (« ce composant satisfait ce contrôle »)
//
// Et trois définitions d'ingestion, telles qu'elles arrivent des fichiers :
//
//   Component          → porte ses propres satisfactions (`satisfies`)
//   StandardDef        → { name: "NIST-800-53", "AC-1": {...}, "AC-2": {...} }
//   CertificationDef   → { name: "FedRAMP-low", standards: { NIST: { AC-1: {} } } }
//
// Les champs non reconnus sont conservés tels quels (`extra`) et restent
// lisibles par nom via le trait Record.
//
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use super::value::{Record, Value};
use crate::error::{Error, Result};

/// Champs supplémentaires transportés sans interprétation.
pub type Extra = Map<String, Json>;

/// Lit un champ scalaire dans les champs supplémentaires.
fn extra_field(extra: &Extra, name: &str) -> Value {
    match extra.get(name) {
        Some(Json::String(s)) => Value::String(s.clone()),
        Some(Json::Bool(b)) => Value::Boolean(*b),
        // Les nombres non entiers (1.0, 2.5) gardent leur forme textuelle
        Some(Json::Number(n)) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::String(n.to_string()),
        },
        _ => Value::Null,
    }
}

// -----------------------------------------------------------------------------
// Component
// -----------------------------------------------------------------------------

/// Un paragraphe de narration d'une satisfaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub text: String,
}

/// La narration d'une satisfaction, transportée sous sa forme d'origine :
/// un texte seul (anciens composants) ou une liste de paragraphes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NarrativeField {
    Text(String),
    Parts(Vec<Narrative>),
}

impl Default for NarrativeField {
    fn default() -> Self {
        NarrativeField::Parts(Vec::new())
    }
}

impl NarrativeField {
    /// Les paragraphes (clé, texte), quelle que soit la forme.
    pub fn parts(&self) -> Vec<(Option<&str>, &str)> {
        match self {
            NarrativeField::Text(text) => vec![(None, text.as_str())],
            NarrativeField::Parts(parts) => parts
                .iter()
                .map(|n| (n.key.as_deref(), n.text.as_str()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            NarrativeField::Text(text) => text.is_empty(),
            NarrativeField::Parts(parts) => parts.is_empty(),
        }
    }

    /// Ajoute un paragraphe ; un texte seul devient le premier paragraphe.
    pub fn push(&mut self, narrative: Narrative) {
        if let NarrativeField::Text(text) = self {
            let first = Narrative { key: None, text: std::mem::take(text) };
            *self = NarrativeField::Parts(vec![first]);
        }
        if let NarrativeField::Parts(parts) = self {
            parts.push(narrative);
        }
    }
}

/// Une revendication embarquée dans un composant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionClaim {
    pub standard_key: String,
    pub control_key: String,
    #[serde(default)]
    pub narrative: NarrativeField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SatisfactionClaim {
    pub fn new(standard_key: &str, control_key: &str) -> Self {
        SatisfactionClaim {
            standard_key: standard_key.to_string(),
            control_key: control_key.to_string(),
            narrative: NarrativeField::default(),
            implementation_status: None,
            extra: Extra::new(),
        }
    }

    pub fn with_narrative(mut self, text: &str) -> Self {
        self.narrative.push(Narrative { key: None, text: text.to_string() });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Peut manquer dans le fichier : le loader le déduit alors du répertoire
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub satisfies: Vec<SatisfactionClaim>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Component {
    pub fn new(key: &str, name: &str) -> Self {
        Component {
            key: key.to_string(),
            name: name.to_string(),
            system: None,
            satisfies: Vec::new(),
            extra: Extra::new(),
        }
    }

    pub fn with_system(mut self, system: &str) -> Self {
        self.system = Some(system.to_string());
        self
    }

    pub fn satisfying(mut self, claim: SatisfactionClaim) -> Self {
        self.satisfies.push(claim);
        self
    }
}

impl Record for Component {
    fn field(&self, name: &str) -> Value {
        match name {
            "key" => Value::from(&self.key),
            "name" => Value::from(&self.name),
            "system" => Value::from(self.system.as_ref()),
            _ => extra_field(&self.extra, name),
        }
    }
}

// -----------------------------------------------------------------------------
// Control
// -----------------------------------------------------------------------------

/// Le corps d'un contrôle dans une définition de standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlBody {
    pub family: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ControlBody {
    pub fn new(family: &str, name: &str) -> Self {
        ControlBody {
            family: family.to_string(),
            name: name.to_string(),
            description: String::new(),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub standard_key: String,
    pub key: String,
    pub family: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Control {
    /// Un contrôle étiqueté par son standard et sa clé.
    pub fn from_body(standard_key: &str, key: &str, body: &ControlBody) -> Self {
        Control {
            standard_key: standard_key.to_string(),
            key: key.to_string(),
            family: body.family.clone(),
            name: body.name.clone(),
            description: body.description.clone(),
            extra: body.extra.clone(),
        }
    }
}

impl Record for Control {
    fn field(&self, name: &str) -> Value {
        match name {
            "standard_key" => Value::from(&self.standard_key),
            "key" => Value::from(&self.key),
            "family" => Value::from(&self.family),
            "name" => Value::from(&self.name),
            "description" => Value::from(&self.description),
            _ => extra_field(&self.extra, name),
        }
    }
}

// -----------------------------------------------------------------------------
// Certification
// -----------------------------------------------------------------------------

/// Une ligne aplatie : (certification, standard, contrôle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Certification {
    pub certification: String,
    pub standard_key: String,
    pub control_key: String,
}

impl Record for Certification {
    fn field(&self, name: &str) -> Value {
        match name {
            "certification" => Value::from(&self.certification),
            "standard_key" => Value::from(&self.standard_key),
            "control_key" => Value::from(&self.control_key),
            _ => Value::Null,
        }
    }
}

// -----------------------------------------------------------------------------
// Satisfaction
// -----------------------------------------------------------------------------

/// Une satisfaction synthétisée à l'ingestion d'un composant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satisfaction {
    pub component_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_key: Option<String>,
    pub standard_key: String,
    pub control_key: String,
    #[serde(default)]
    pub narrative: NarrativeField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Satisfaction {
    /// Injecte component_key et system_key dans une revendication.
    ///
    /// Ces deux noms sont retirés des champs supplémentaires de la
    /// revendication : ceux du composant priment.
    pub fn from_claim(component: &Component, claim: &SatisfactionClaim) -> Self {
        let mut extra = claim.extra.clone();
        extra.remove("component_key");
        extra.remove("system_key");
        Satisfaction {
            component_key: component.key.clone(),
            system_key: component.system.clone(),
            standard_key: claim.standard_key.clone(),
            control_key: claim.control_key.clone(),
            narrative: claim.narrative.clone(),
            implementation_status: claim.implementation_status.clone(),
            extra,
        }
    }
}

impl Record for Satisfaction {
    fn field(&self, name: &str) -> Value {
        match name {
            "component_key" => Value::from(&self.component_key),
            "system_key" => Value::from(self.system_key.as_ref()),
            "standard_key" => Value::from(&self.standard_key),
            "control_key" => Value::from(&self.control_key),
            "implementation_status" => Value::from(self.implementation_status.as_ref()),
            _ => extra_field(&self.extra, name),
        }
    }
}

// -----------------------------------------------------------------------------
// StandardDef
// -----------------------------------------------------------------------------

/// Un standard : un nom et ses contrôles, dans l'ordre du fichier.
///
/// Dans les fichiers, `name` cohabite avec les contrôles au même niveau :
///
/// ```yaml
/// name: NIST-800-53
/// AC-1:
///   family: AC
///   name: Access Control Policy and Procedures
/// ```
///
/// `from_value` lit ce mapping sans jamais le modifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct StandardDef {
    pub name: String,
    pub controls: Vec<(String, ControlBody)>,
}

impl StandardDef {
    pub fn new(name: &str) -> Self {
        StandardDef { name: name.to_string(), controls: Vec::new() }
    }

    pub fn add_control(&mut self, key: &str, body: ControlBody) -> &mut Self {
        self.controls.push((key.to_string(), body));
        self
    }

    pub fn from_value(value: &Json) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::malformed("standard", "expected a mapping"))?;

        let name = match obj.get("name") {
            Some(Json::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => return Err(Error::malformed("standard", "missing 'name'")),
        };

        let mut controls = Vec::with_capacity(obj.len().saturating_sub(1));
        for (key, body) in obj.iter().filter(|(k, _)| k.as_str() != "name") {
            let body = ControlBody::deserialize(body).map_err(|e| {
                Error::malformed(format!("control {}/{}", name, key), e.to_string())
            })?;
            controls.push((key.clone(), body));
        }

        Ok(StandardDef { name, controls })
    }
}

impl TryFrom<Json> for StandardDef {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self> {
        StandardDef::from_value(&value)
    }
}

// -----------------------------------------------------------------------------
// CertificationDef
// -----------------------------------------------------------------------------

/// Une certification : standard → liste de clés de contrôles.
///
/// La valeur associée à chaque contrôle dans le fichier est ignorée.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct CertificationDef {
    pub name: String,
    pub standards: Vec<(String, Vec<String>)>,
}

impl CertificationDef {
    pub fn new(name: &str) -> Self {
        CertificationDef { name: name.to_string(), standards: Vec::new() }
    }

    pub fn add_standard(&mut self, standard: &str, controls: &[&str]) -> &mut Self {
        self.standards.push((
            standard.to_string(),
            controls.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn from_value(value: &Json) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::malformed("certification", "expected a mapping"))?;

        let name = match obj.get("name") {
            Some(Json::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => return Err(Error::malformed("certification", "missing 'name'")),
        };

        let mut standards = Vec::new();
        match obj.get("standards") {
            None | Some(Json::Null) => {}
            Some(Json::Object(by_standard)) => {
                for (standard, controls) in by_standard {
                    let keys = match controls {
                        Json::Null => Vec::new(),
                        Json::Object(m) => m.keys().cloned().collect(),
                        _ => {
                            return Err(Error::malformed(
                                format!("certification {}", name),
                                format!("standard '{}' must map control keys", standard),
                            ))
                        }
                    };
                    standards.push((standard.clone(), keys));
                }
            }
            Some(_) => {
                return Err(Error::malformed(
                    format!("certification {}", name),
                    "'standards' must be a mapping",
                ))
            }
        }

        Ok(CertificationDef { name, standards })
    }
}

impl TryFrom<Json> for CertificationDef {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self> {
        CertificationDef::from_value(&value)
    }
}

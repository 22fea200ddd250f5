// =============================================================================
// CORE — Le store en mémoire
// =============================================================================
//
// Ce module regroupe toute la logique de stockage pure :
// pas de fichiers, pas de HTTP — uniquement des tables, des clés et
// des regroupements.
//
// Architecture :
//   value      → les valeurs de champs et le trait Record
//   collection → la table à clé composite + le pipeline de requête
//   nest       → le regroupement multi-niveaux
//   model      → les entités OpenControl et leurs définitions d'ingestion
//   database   → les quatre tables et les méthodes d'ingestion
//
// =============================================================================

pub mod value;
pub mod collection;
pub mod nest;
pub mod model;
pub mod database;

pub use collection::{Chain, Collection, Groups};
pub use database::Database;
pub use model::{
    Certification, CertificationDef, Component, Control, ControlBody, Narrative, NarrativeField,
    Satisfaction, SatisfactionClaim, StandardDef,
};
pub use nest::{nest, Nest};
pub use value::{Record, Value};

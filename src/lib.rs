// =============================================================================
// OPENCONTROL — Store en mémoire et navigation pour données de conformité
// =============================================================================
//
// Ce crate charge des définitions OpenControl (composants, standards,
// certifications) dans un store en mémoire à clés composites, puis les
// expose en lecture : jointures prêtes pour une page, et une table des
// matières hiérarchique par standard / famille / certification.
//
// Architecture :
//   core/    → le store pur (collections, nest, entités, Database)
//   query    → find_control / find_component (jointures)
//   nav/     → chemins canoniques et sitemap
//   load     → lecture d'un répertoire YAML
//   error    → NotFound, MalformedInput, LogicError
//
// Flux : ingestion → Database (écrite une fois) → { query, nav } (lues
// autant qu'on veut). Tout est synchrone et mono-thread : l'ingestion
// se termine avant la première lecture.
//
// =============================================================================

pub mod core;
pub mod error;
pub mod load;
pub mod nav;
pub mod query;

pub use crate::core::Database;
pub use error::{EntityKind, Error, Result};
pub use nav::{build_sitemap, Sitemap};
pub use query::{find_component, find_control};

// =============================================================================
// NAV — Navigation : chemins canoniques et table des matières
// =============================================================================
//
//   links   → un chemin par type d'entité (partagé par le sitemap et les pages)
//   sitemap → le builder à pile, l'arbre, l'index plat et build_sitemap(db)
//
// =============================================================================

pub mod links;
pub mod sitemap;

pub use sitemap::{build_sitemap, NavInfo, NodeRef, Sitemap, SitemapBuilder};

// =============================================================================
// SITEMAP — La table des matières hiérarchique
// =============================================================================
//
// Le sitemap est construit par une MACHINE À PILE explicite :
//
//   begin(path, label)       → ouvre une section (empilée)
//   add(path, label, title)  → ajoute une feuille à la section du sommet
//   end()                    → dépile la section et l'attache à son parent
//
//   begin /standards
//     begin /standards/NIST-800-53
//       begin /family/NIST-800-53/AC
//         add /standards/NIST-800-53/AC-1
//         add /standards/NIST-800-53/AC-2
//       end
//     end
//   end
//
// Un end() sans begin() correspondant, ou un finish() avec des sections
// encore ouvertes, est une LogicError : on abandonne plutôt que de
// produire un arbre mal formé.
//
// Les nœuds vivent dans une arène (Vec) ; l'index plat chemin → nœud
// donne un lookup en O(1) pour la navigation (fil d'Ariane, enfants).
//
// Trois sections de premier niveau :
//   1. Components      → liste plate
//   2. Standards       → standard → famille → contrôles   (via nest)
//   3. Certifications  → certification → (standard, famille) → contrôles
//
// =============================================================================

use std::collections::HashMap;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::{debug, warn};

use super::links;
use crate::core::{nest, Chain, Control, Database, Record, Value};
use crate::error::{EntityKind, Error, Result};

/// Index d'un nœud dans l'arène.
pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq)]
struct TocNode {
    path: String,
    label: String,
    /// Présent seulement sur les feuilles
    title: Option<String>,
    leaf: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TocNode {
    fn section(path: &str, label: &str) -> Self {
        TocNode {
            path: path.to_string(),
            label: label.to_string(),
            title: None,
            leaf: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Construit un `Sitemap` par appels begin/add/end équilibrés.
#[derive(Debug)]
pub struct SitemapBuilder {
    nodes: Vec<TocNode>,
    items: HashMap<String, NodeId>,
    stack: Vec<NodeId>,
}

impl Default for SitemapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SitemapBuilder {
    pub fn new() -> Self {
        SitemapBuilder {
            nodes: vec![TocNode::section("/", "Contents")],
            items: HashMap::new(),
            stack: vec![ROOT],
        }
    }

    fn register(&mut self, path: &str, id: NodeId) {
        if self.items.insert(path.to_string(), id).is_some() {
            warn!(path, "sitemap path registered twice, keeping the latest node");
        }
    }

    fn top(&self) -> NodeId {
        // La racine ne quitte jamais la pile
        self.stack.last().copied().unwrap_or(ROOT)
    }

    /// Ouvre une nouvelle section.
    pub fn begin(&mut self, path: &str, label: &str) -> &mut Self {
        let id = self.nodes.len();
        self.nodes.push(TocNode::section(path, label));
        self.register(path, id);
        self.stack.push(id);
        self
    }

    /// Ajoute une feuille à la section ouverte.
    pub fn add(&mut self, path: &str, label: &str, title: &str) -> &mut Self {
        let id = self.nodes.len();
        let parent = self.top();
        self.nodes.push(TocNode {
            path: path.to_string(),
            label: label.to_string(),
            title: Some(title.to_string()),
            leaf: true,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        self.register(path, id);
        self
    }

    /// Ferme la section ouverte et l'attache à son parent.
    pub fn end(&mut self) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::LogicError(
                "sitemap end() called with no open section".into(),
            ));
        }
        let id = self.stack.pop().unwrap_or(ROOT);
        let parent = self.top();
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        Ok(())
    }

    /// Nombre de sections encore ouvertes.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn finish(self) -> Result<Sitemap> {
        if self.stack.len() != 1 {
            let open: Vec<&str> = self.stack[1..]
                .iter()
                .map(|&id| self.nodes[id].path.as_str())
                .collect();
            return Err(Error::LogicError(format!(
                "sitemap finished with unclosed sections: {}",
                open.join(", ")
            )));
        }
        Ok(Sitemap { nodes: self.nodes, items: self.items })
    }
}

// =============================================================================
// SITEMAP
// =============================================================================

/// L'arbre de navigation et son index plat.
#[derive(Debug, Clone)]
pub struct Sitemap {
    nodes: Vec<TocNode>,
    items: HashMap<String, NodeId>,
}

impl Sitemap {
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { map: self, id: ROOT }
    }

    /// Le nœud enregistré sous ce chemin.
    pub fn node(&self, path: &str) -> Option<NodeRef<'_>> {
        self.items.get(path).map(|&id| NodeRef { map: self, id })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.items.contains_key(path)
    }

    /// Tous les chemins de l'index plat (ordre non spécifié).
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Nombre de chemins indexés.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Les sections de premier niveau.
    pub fn toplinks(&self) -> Vec<NodeRef<'_>> {
        self.root().children().collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.leaf).count()
    }

    /// Contexte de navigation d'une page : le nœud, son fil d'Ariane
    /// (du premier niveau jusqu'au parent) et ses enfants.
    pub fn navinfo(&self, path: &str) -> Option<NavInfo<'_>> {
        let node = self.node(path)?;
        let mut breadcrumbs: Vec<NodeRef<'_>> = node.ancestors().collect();
        breadcrumbs.reverse();
        Some(NavInfo {
            node,
            breadcrumbs,
            children: node.children().collect(),
        })
    }

    /// Comme `navinfo`, mais un chemin inconnu est un NotFound (page 404).
    pub fn require(&self, path: &str) -> Result<NavInfo<'_>> {
        self.navinfo(path)
            .ok_or_else(|| Error::not_found(EntityKind::Page, path))
    }
}

/// Une vue empruntée sur un nœud.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    map: &'a Sitemap,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a TocNode {
        &self.map.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn path(&self) -> &'a str {
        &self.node().path
    }

    pub fn label(&self) -> &'a str {
        &self.node().label
    }

    pub fn title(&self) -> Option<&'a str> {
        self.node().title.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.node().leaf
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let map = self.map;
        self.node().parent.map(|id| NodeRef { map, id })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let map = self.map;
        self.node().children.iter().map(move |&id| NodeRef { map, id })
    }

    /// Les ancêtres, du parent vers le premier niveau (racine exclue).
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), |n| n.parent()).filter(|n| !n.is_root())
    }

    /// Nombre de feuilles sous ce nœud (lui compris).
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children().map(|c| c.leaf_count()).sum()
        }
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", &self.path())
            .field("label", &self.label())
            .field("children", &self.node().children.len())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.map, other.map) && self.id == other.id
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let children: Vec<NodeRef<'_>> = self.children().collect();
        let mut s = serializer.serialize_struct("TocNode", 4)?;
        s.serialize_field("path", self.path())?;
        s.serialize_field("label", self.label())?;
        s.serialize_field("title", &self.title())?;
        s.serialize_field("children", &children)?;
        s.end()
    }
}

impl Serialize for Sitemap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

/// Contexte de navigation d'une page.
#[derive(Debug, Clone, Serialize)]
pub struct NavInfo<'a> {
    pub node: NodeRef<'a>,
    pub breadcrumbs: Vec<NodeRef<'a>>,
    pub children: Vec<NodeRef<'a>>,
}

// =============================================================================
// CONSTRUCTION DEPUIS LA DATABASE
// =============================================================================

/// Une ligne dénormalisée : certification + contrôle.
#[derive(Debug, Clone, Copy)]
struct CertifiedControl<'a> {
    certification: &'a str,
    control: &'a Control,
}

impl Record for CertifiedControl<'_> {
    fn field(&self, name: &str) -> Value {
        match name {
            "certification" => Value::from(self.certification),
            "control_key" => Value::from(&self.control.key),
            _ => self.control.field(name),
        }
    }
}

fn control_title(control: &Control) -> String {
    format!("{} - {}", control.key, control.name)
}

/// Parcourt la Database une fois et construit le sitemap complet.
pub fn build_sitemap(db: &Database) -> Result<Sitemap> {
    let mut site = SitemapBuilder::new();

    // --- 1. Components ---
    site.begin(&links::components(), "Components");
    for component in db.components().iter() {
        site.add(&links::component_of(component), &component.key, &component.name);
    }
    site.end()?;

    // --- 2. Standards → familles → contrôles ---
    site.begin(&links::standards(), "Standards");
    let by_standard = nest(db.controls().iter().collect(), &["standard_key", "family"]);
    for (standard_key, families) in by_standard.entries() {
        let standard_key = standard_key.to_string();
        debug!("creating toc for standard {}", standard_key);
        site.begin(&links::standard(&standard_key), &standard_key);
        for (family, controls) in families.entries() {
            let family = family.to_string();
            debug!("creating subtoc for family {}", family);
            site.begin(&links::family(&standard_key, &family), &family);
            for control in controls.items() {
                site.add(&links::control_of(control), &control.key, &control_title(control));
            }
            site.end()?;
        }
        site.end()?;
    }
    site.end()?;

    // --- 3. Certifications → (standard, famille) → contrôles ---
    site.begin(&links::certifications(), "Certifications");
    let by_certification = db
        .controls()
        .chain()
        .flat_map(|control| {
            db.certifications()
                .chain()
                .filter_eq(&[
                    ("standard_key", Value::from(&control.standard_key)),
                    ("control_key", Value::from(&control.key)),
                ])
                .map(move |cert| CertifiedControl {
                    certification: cert.certification.as_str(),
                    control,
                })
                .value()
        })
        .group_by("certification");

    for (certification, certcontrols) in by_certification {
        let certification = certification.to_string();
        debug!(
            "creating toc for certification {} ({} controls)",
            certification,
            certcontrols.len()
        );
        site.begin(&links::certification(&certification), &certification);
        let by_family = Chain::from_vec(certcontrols).group_by_key(|cc| {
            (cc.control.standard_key.as_str(), cc.control.family.as_str())
        });
        for ((standard_key, family), controls) in by_family {
            let stdfamily = format!("{}-{}", standard_key, family);
            debug!("creating tocentry for {}", stdfamily);
            site.begin(&links::certification_group(&certification, &stdfamily), &stdfamily);
            for cc in controls {
                site.add(
                    &links::certification_control(&certification, standard_key, &cc.control.key),
                    &cc.control.key,
                    &control_title(cc.control),
                );
            }
            site.end()?;
        }
        site.end()?;
    }
    site.end()?;

    site.finish()
}

// =============================================================================
// COLLECTION — Une table en mémoire avec clé primaire composite
// =============================================================================
//
// Une Collection, c'est :
//   - une liste ordonnée d'enregistrements (ordre d'insertion stable)
//   - une clé primaire OPTIONNELLE : une liste ordonnée de noms de champs
//   - un index   tuple de clé → position   pour les lookups en O(1)
//
//   Collection::keyed("controls", &["standard_key", "key"])
//
//     records : [ AC-1, AC-2, AU-1 ]          (Vec<T>, ordre d'insertion)
//     index   : { ("NIST", "AC-1") → 0,
//                 ("NIST", "AC-2") → 1,
//                 ("NIST", "AU-1") → 2 }
//
// Sans clé primaire, seuls l'ajout et le parcours complet ont un sens.
//
// CONFLIT DE CLÉ : le dernier écrit gagne. Le nouvel enregistrement
// remplace l'ancien À SA PLACE (la position d'insertion d'origine est
// conservée) et l'ancien est rendu à l'appelant.
//
// PIPELINE : `chain()` ouvre une requête paresseuse sur un instantané
// emprunté (`&T`). Tant que la Chain vit, la Collection ne peut pas être
// modifiée : le borrow checker garantit la pureté du pipeline.
//
// =============================================================================

use std::collections::HashMap;
use std::hash::Hash;

use tracing::warn;

use super::value::{Record, Value};
use crate::error::{Error, Result};

/// Une table en mémoire.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    /// Nom de la table (pour les logs et les erreurs)
    name: String,
    /// Clé primaire composite : noms de champs, dans l'ordre
    primary_key: Option<Vec<String>>,
    /// Les enregistrements, dans l'ordre d'insertion
    records: Vec<T>,
    /// Index : tuple de clé → position dans `records`
    index: HashMap<Vec<Value>, usize>,
}

impl<T> Collection<T> {
    /// Crée une collection sans clé primaire.
    pub fn new(name: &str) -> Self {
        Collection {
            name: name.to_string(),
            primary_key: None,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Crée une collection indexée par une clé composite.
    pub fn keyed(name: &str, primary_key: &[&str]) -> Self {
        Collection {
            name: name.to_string(),
            primary_key: Some(primary_key.iter().map(|s| s.to_string()).collect()),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> Option<&[String]> {
        self.primary_key.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Instantané ordonné, en lecture seule.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Ouvre un pipeline de requête paresseux sur les enregistrements.
    pub fn chain(&self) -> Chain<'_, &T> {
        Chain::from_fn(move || self.records.iter().collect())
    }
}

impl<T: Record> Collection<T> {
    /// Ajoute un enregistrement.
    ///
    /// Retourne l'enregistrement remplacé si la clé existait déjà
    /// (dernier écrit gagne, position conservée).
    ///
    /// Un champ de clé absent ou vide est une `MalformedInput` : la ligne
    /// n'est pas insérée.
    pub fn add(&mut self, record: T) -> Result<Option<T>> {
        let Some(pk) = &self.primary_key else {
            self.records.push(record);
            return Ok(None);
        };

        let names: Vec<&str> = pk.iter().map(String::as_str).collect();
        let key = record.fields(&names);
        if let Some(i) = key.iter().position(Value::is_blank) {
            return Err(Error::malformed(
                self.name.as_str(),
                format!("primary key field '{}' is missing", pk[i]),
            ));
        }

        match self.index.get(&key) {
            Some(&pos) => {
                warn!(
                    collection = %self.name,
                    key = %display_key(&key),
                    "duplicate primary key, replacing previous record"
                );
                Ok(Some(std::mem::replace(&mut self.records[pos], record)))
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
                Ok(None)
            }
        }
    }

    /// Lookup exact par clé composite. Absent n'est pas une erreur.
    ///
    /// ```ignore
    /// db.controls().find_by_key(["NIST-800-53", "AC-1"])
    /// ```
    pub fn find_by_key<I, V>(&self, key: I) -> Option<&T>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.primary_key.as_ref()?;
        let key: Vec<Value> = key.into_iter().map(Into::into).collect();
        self.index.get(&key).map(|&pos| &self.records[pos])
    }

    /// Supprime les enregistrements refusés par le prédicat ; l'ordre des
    /// autres est conservé. Retourne le nombre de lignes supprimées.
    pub fn retain<P>(&mut self, mut keep: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        let removed = before - self.records.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.index.clear();
        let Some(pk) = &self.primary_key else {
            return;
        };
        let names: Vec<&str> = pk.iter().map(String::as_str).collect();
        for (pos, record) in self.records.iter().enumerate() {
            self.index.insert(record.fields(&names), pos);
        }
    }
}

fn display_key(key: &[Value]) -> String {
    key.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("/")
}

// =============================================================================
// CHAIN — Pipeline de requête paresseux
// =============================================================================
//
// Chaque étape enveloppe la précédente dans une closure ; rien n'est
// évalué avant un terminal (`value`, `for_each`, `count`, `group_by`).
//
//   db.satisfactions().chain()
//       .filter_eq(&[("standard_key", "NIST".into())])
//       .sort_by_fields(&["component_key"])
//       .map(|sat| populate(db, sat))
//       .value()
//
// =============================================================================

/// Un pipeline paresseux produisant une séquence ordonnée de `T`.
pub struct Chain<'a, T> {
    run: Box<dyn FnOnce() -> Vec<T> + 'a>,
}

impl<'a, T: 'a> Chain<'a, T> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> Vec<T> + 'a,
    {
        Chain { run: Box::new(f) }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Chain::from_fn(move || items)
    }

    /// Garde les éléments qui satisfont le prédicat.
    pub fn filter<P>(self, mut pred: P) -> Self
    where
        P: FnMut(&T) -> bool + 'a,
    {
        let run = self.run;
        Chain::from_fn(move || run().into_iter().filter(|t| pred(t)).collect())
    }

    pub fn map<U, F>(self, f: F) -> Chain<'a, U>
    where
        U: 'a,
        F: FnMut(T) -> U + 'a,
    {
        let run = self.run;
        Chain::from_fn(move || run().into_iter().map(f).collect())
    }

    pub fn flat_map<U, I, F>(self, f: F) -> Chain<'a, U>
    where
        U: 'a,
        I: IntoIterator<Item = U>,
        F: FnMut(T) -> I + 'a,
    {
        let run = self.run;
        Chain::from_fn(move || run().into_iter().flat_map(f).collect())
    }

    /// Tri ascendant stable selon une clé calculée.
    pub fn sort_by_key<K, F>(self, mut f: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K + 'a,
    {
        let run = self.run;
        Chain::from_fn(move || {
            let mut items = run();
            items.sort_by_key(|t| f(t));
            items
        })
    }

    /// Regroupe selon une clé calculée. Terminal.
    pub fn group_by_key<K, F>(self, f: F) -> Groups<K, T>
    where
        K: Eq + Hash + Clone,
        F: FnMut(&T) -> K,
    {
        Groups::build(self.value(), f)
    }

    /// Exécute le pipeline et appelle `f` sur chaque élément. Terminal.
    pub fn for_each<F>(self, f: F)
    where
        F: FnMut(T),
    {
        self.value().into_iter().for_each(f)
    }

    pub fn count(self) -> usize {
        self.value().len()
    }

    /// Matérialise le pipeline.
    pub fn value(self) -> Vec<T> {
        (self.run)()
    }
}

impl<'a, T: Record + 'a> Chain<'a, T> {
    /// Filtre par égalité sur une carte champ → valeur.
    /// Tous les champs doivent correspondre.
    pub fn filter_eq(self, conditions: &[(&str, Value)]) -> Self {
        let conditions: Vec<(String, Value)> = conditions
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.filter(move |t| conditions.iter().all(|(k, v)| t.field(k) == *v))
    }

    /// Tri ascendant stable, lexicographique sur le tuple de champs.
    pub fn sort_by_fields(self, fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
        self.sort_by_key(move |t| {
            let names: Vec<&str> = fields.iter().map(String::as_str).collect();
            t.fields(&names)
        })
    }

    /// Regroupe selon la valeur d'un champ. Terminal.
    pub fn group_by(self, field: &str) -> Groups<Value, T> {
        self.group_by_key(|t| t.field(field))
    }
}

// =============================================================================
// GROUPS — Carte ordonnée clé → groupe
// =============================================================================

/// Le résultat d'un regroupement.
///
/// Les clés sont uniques et rangées dans l'ordre de leur PREMIÈRE
/// apparition ; chaque groupe conserve l'ordre de ses éléments.
#[derive(Debug, Clone)]
pub struct Groups<K, T> {
    entries: Vec<(K, Vec<T>)>,
    positions: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, T> Groups<K, T> {
    pub fn build<I, F>(items: I, mut key_of: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> K,
    {
        let mut entries: Vec<(K, Vec<T>)> = Vec::new();
        let mut positions: HashMap<K, usize> = HashMap::new();
        for item in items {
            let key = key_of(&item);
            match positions.get(&key) {
                Some(&pos) => entries[pos].1.push(item),
                None => {
                    positions.insert(key.clone(), entries.len());
                    entries.push((key, vec![item]));
                }
            }
        }
        Groups { entries, positions }
    }

    pub fn get(&self, key: &K) -> Option<&[T]> {
        self.positions.get(key).map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[T])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, T> IntoIterator for Groups<K, T> {
    type Item = (K, Vec<T>);
    type IntoIter = std::vec::IntoIter<(K, Vec<T>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

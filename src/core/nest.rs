// =============================================================================
// NEST — Regroupement multi-niveaux
// =============================================================================
//
// nest(records, ["standard_key", "family"]) :
//
//   NIST-800-53
//     ├── AC : [AC-1, AC-2]
//     └── AU : [AU-1]
//   PCI-DSS
//     └── 1  : [1.1]
//
// On regroupe par le premier champ, puis chaque groupe par le suivant,
// et ainsi de suite ; quand il n'y a plus de champ, on obtient la liste
// ordonnée des enregistrements.
//
// Les clés d'un niveau sont uniques et rangées par PREMIÈRE APPARITION
// dans l'entrée (pas triées). Le nombre total de feuilles est toujours
// égal au nombre d'enregistrements en entrée, quel que soit l'ordre des
// champs.
//
// =============================================================================

use super::collection::Groups;
use super::value::{Record, Value};

/// Un arbre de regroupement.
#[derive(Debug, Clone, PartialEq)]
pub enum Nest<T> {
    /// Plus de champ : les enregistrements, dans l'ordre d'entrée
    Leaf(Vec<T>),
    /// Un niveau : valeur du champ → sous-arbre
    Branch(Vec<(Value, Nest<T>)>),
}

/// Regroupe récursivement `records` selon `fields`.
pub fn nest<T: Record>(records: Vec<T>, fields: &[&str]) -> Nest<T> {
    match fields.split_first() {
        None => Nest::Leaf(records),
        Some((first, rest)) => Nest::Branch(
            Groups::build(records, |r| r.field(first))
                .into_iter()
                .map(|(key, group)| (key, nest(group, rest)))
                .collect(),
        ),
    }
}

impl<T> Nest<T> {
    /// Nombre total d'enregistrements dans les feuilles.
    pub fn leaf_count(&self) -> usize {
        match self {
            Nest::Leaf(items) => items.len(),
            Nest::Branch(children) => children.iter().map(|(_, c)| c.leaf_count()).sum(),
        }
    }

    /// Profondeur (nombre de niveaux de regroupement).
    pub fn depth(&self) -> usize {
        match self {
            Nest::Leaf(_) => 0,
            Nest::Branch(children) => {
                1 + children.iter().map(|(_, c)| c.depth()).max().unwrap_or(0)
            }
        }
    }

    /// Les entrées d'un niveau de branche (vide pour une feuille).
    pub fn entries(&self) -> &[(Value, Nest<T>)] {
        match self {
            Nest::Branch(children) => children,
            Nest::Leaf(_) => &[],
        }
    }

    /// Les enregistrements d'une feuille (vide pour une branche).
    pub fn items(&self) -> &[T] {
        match self {
            Nest::Leaf(items) => items,
            Nest::Branch(_) => &[],
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Nest<T>> {
        self.entries().iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        a: String,
        b: String,
    }

    impl Record for Row {
        fn field(&self, name: &str) -> Value {
            match name {
                "a" => Value::from(&self.a),
                "b" => Value::from(&self.b),
                _ => Value::Null,
            }
        }
    }

    fn row(a: &str, b: &str) -> Row {
        Row { a: a.into(), b: b.into() }
    }

    fn rows() -> Vec<Row> {
        vec![row("y", "1"), row("x", "2"), row("y", "2"), row("x", "1"), row("y", "1")]
    }

    #[test]
    fn test_nest_first_appearance_order() {
        let n = nest(rows(), &["a", "b"]);
        let top: Vec<&Value> = n.entries().iter().map(|(k, _)| k).collect();
        assert_eq!(top, vec![&Value::from("y"), &Value::from("x")]);

        let y = n.get(&Value::from("y")).unwrap();
        let ys: Vec<&Value> = y.entries().iter().map(|(k, _)| k).collect();
        assert_eq!(ys, vec![&Value::from("1"), &Value::from("2")]);
        assert_eq!(y.get(&Value::from("1")).unwrap().items().len(), 2);
    }

    #[test]
    fn test_nest_no_fields_is_leaf() {
        let n = nest(rows(), &[]);
        assert_eq!(n, Nest::Leaf(rows()));
        assert_eq!(n.depth(), 0);
    }

    #[test]
    fn test_nest_empty_input() {
        let n: Nest<Row> = nest(vec![], &["a", "b"]);
        assert_eq!(n.leaf_count(), 0);
        assert!(n.entries().is_empty());
    }

    #[test]
    fn test_field_order_changes_shape() {
        let ab = nest(rows(), &["a", "b"]);
        let ba = nest(rows(), &["b", "a"]);
        assert_ne!(ab, ba);
        assert_eq!(ab.depth(), 2);
        assert_eq!(ab.leaf_count(), 5);
        assert_eq!(ba.leaf_count(), 5);
    }

    proptest! {
        #[test]
        fn nest_preserves_leaf_count(
            pairs in prop::collection::vec(("[a-c]", "[0-2]"), 0..40)
        ) {
            let records: Vec<Row> = pairs.iter().map(|(a, b)| row(a, b)).collect();
            let ab = nest(records.clone(), &["a", "b"]);
            let ba = nest(records.clone(), &["b", "a"]);
            prop_assert_eq!(ab.leaf_count(), records.len());
            prop_assert_eq!(ba.leaf_count(), records.len());
        }
    }
}

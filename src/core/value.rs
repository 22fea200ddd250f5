// =============================================================================
// VALUE — Les valeurs de champs et le trait Record
// =============================================================================
//
// Les collections ne connaissent pas la forme exacte de leurs lignes.
// Elles ne voient qu'une chose : un enregistrement expose ses champs
// par NOM, et chaque champ vaut une `Value`.
//
// C'est ce qui permet :
//   - les clés primaires composites  (["standard_key", "key"])
//   - les filtres par égalité         ({ component_key: "AU_policy" })
//   - les tris multi-champs           (["standard_key", "control_key"])
//   - le regroupement et le Nest      (["standard_key", "family"])
//
// Une `Value` est totalement ordonnée et hashable : un tuple de valeurs
// (`Vec<Value>`) sert directement de clé d'index.
//
//   Null < Boolean < Integer < String
//
// =============================================================================

use std::fmt;

/// Une valeur de champ.
///
/// L'ordre de déclaration des variantes fixe l'ordre total utilisé par
/// les tris : un champ absent (`Null`) passe toujours en premier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Le texte de la valeur, si c'est une chaîne.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Une clé inutilisable : absente ou vide.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Un enregistrement dont les champs sont lisibles par nom.
///
/// Un champ inconnu vaut `Value::Null` : ce n'est jamais une erreur.
pub trait Record {
    fn field(&self, name: &str) -> Value;

    /// Le tuple de valeurs pour une liste de champs (clé composite).
    fn fields(&self, names: &[&str]) -> Vec<Value> {
        names.iter().map(|n| self.field(n)).collect()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Value {
        (**self).field(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        a: String,
        b: Option<String>,
    }

    impl Record for Row {
        fn field(&self, name: &str) -> Value {
            match name {
                "a" => Value::from(&self.a),
                "b" => Value::from(self.b.clone()),
                _ => Value::Null,
            }
        }
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Boolean(true) < Value::Integer(0));
        assert!(Value::Integer(99) < Value::from("a"));
        assert!(Value::from("AC-1") < Value::from("AC-2"));
    }

    #[test]
    fn test_record_fields() {
        let row = Row { a: "x".into(), b: None };
        assert_eq!(row.fields(&["a", "b", "zz"]), vec![Value::from("x"), Value::Null, Value::Null]);
        // Un &Row est aussi un Record
        let r = &row;
        assert_eq!(r.field("a"), Value::from("x"));
    }

    #[test]
    fn test_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("  ").is_blank());
        assert!(!Value::from("k").is_blank());
        assert!(!Value::Integer(0).is_blank());
    }
}

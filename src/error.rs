// =============================================================================
// ERROR — Les erreurs du store OpenControl
// =============================================================================
//
// Trois familles d'erreurs seulement :
//   NotFound       → une clé racine demandée directement n'existe pas
//   MalformedInput → une définition ingérée est incomplète ou mal typée
//   LogicError     → le builder de sitemap est déséquilibré (begin/end)
//
// Les références pendantes (une satisfaction qui pointe vers un contrôle
// absent) ne sont PAS des erreurs : elles deviennent des champs absents
// au moment de la jointure.
//
// =============================================================================

use std::fmt;
use std::path::PathBuf;

/// Le type d'entité concerné par un `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Component,
    Control,
    Standard,
    Certification,
    Page,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Component => "component",
            EntityKind::Control => "control",
            EntityKind::Standard => "standard",
            EntityKind::Certification => "certification",
            EntityKind::Page => "page",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("malformed {what}: {reason}")]
    MalformedInput { what: String, reason: String },

    #[error("logic error: {0}")]
    LogicError(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Error::NotFound { kind, id: id.into() }
    }

    pub fn malformed(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Vrai pour les erreurs à traduire en réponse « page introuvable ».
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found(EntityKind::Control, "NIST-800-53/AC-1");
        assert_eq!(err.to_string(), "control NIST-800-53/AC-1 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_message() {
        let err = Error::malformed("standard", "missing 'name'");
        assert_eq!(err.to_string(), "malformed standard: missing 'name'");
        assert!(!err.is_not_found());
    }
}

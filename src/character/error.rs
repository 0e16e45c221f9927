//! Character store errors.

use thiserror::Error;

/// Errors raised while resolving, reading, or validating a persona card.
#[derive(Debug, Error)]
pub enum CharacterError {
    /// The requested id is not a bare identifier.
    #[error("invalid character id '{0}': expected letters, digits or '_' not starting with a digit")]
    InvalidIdentifier(String),

    /// No card exists for the id.
    #[error("character '{0}' does not exist")]
    PersonaNotFound(String),

    /// The card exists but is unparseable or lacks a required field.
    #[error("character '{id}' is malformed: missing or invalid '{field}'{}", detail_suffix(.detail))]
    MalformedPersona {
        id: String,
        field: String,
        detail: Option<String>,
    },

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}

impl CharacterError {
    pub(crate) fn malformed(id: &str, field: impl Into<String>) -> Self {
        Self::MalformedPersona {
            id: id.to_string(),
            field: field.into(),
            detail: None,
        }
    }
}

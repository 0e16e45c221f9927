//! Character store - resolves persona ids to YAML cards on disk.
//!
//! Each persona lives in `<dir>/<id>.yaml`. Ids are validated before they
//! touch the filesystem so a request can never escape the card directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::definition::PersonaDefinition;
use super::error::CharacterError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

const CARD_EXTENSION: &str = "yaml";

/// Whether `id` is a lowercase bare identifier usable as a card file stem.
///
/// Uppercase is rejected so `Lazul` cannot alias `lazul.yaml` on
/// case-insensitive filesystems.
pub fn is_valid_identifier(id: &str) -> bool {
    IDENTIFIER.is_match(id)
}

/// Loads persona cards from a directory.
///
/// Cards are read on every call unless the read-through cache is enabled
/// with [`CharacterStore::with_cache`]. Cached entries live until the
/// process exits; cards are not watched.
#[derive(Debug, Clone)]
pub struct CharacterStore {
    dir: PathBuf,
    cache: Option<Arc<DashMap<String, PersonaDefinition>>>,
}

impl CharacterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: None,
        }
    }

    /// Enable the read-through cache keyed by persona id.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(Arc::new(DashMap::new()));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn card_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{CARD_EXTENSION}"))
    }

    /// Load and validate the persona named `id`.
    pub fn load_persona(&self, id: &str) -> Result<PersonaDefinition, CharacterError> {
        if !is_valid_identifier(id) {
            return Err(CharacterError::InvalidIdentifier(id.to_string()));
        }

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(id)) {
            return Ok(hit.value().clone());
        }

        let path = self.card_path(id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CharacterError::PersonaNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let def = PersonaDefinition::from_yaml(id, &content)?;
        tracing::debug!(character = id, path = %path.display(), "loaded persona card");

        if let Some(cache) = &self.cache {
            cache.insert(id.to_string(), def.clone());
        }
        Ok(def)
    }

    /// Load several personas, failing on the first error.
    pub fn load_many(&self, ids: &[String]) -> Result<Vec<PersonaDefinition>, CharacterError> {
        ids.iter().map(|id| self.load_persona(id)).collect()
    }

    /// Ids of all cards currently in the directory, sorted.
    ///
    /// Files whose stem is not a valid identifier are skipped since they
    /// could never be loaded. A missing directory yields an empty list.
    pub fn list_roles(&self) -> Result<Vec<String>, CharacterError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut roles = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != CARD_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_identifier(stem) => roles.push(stem.to_string()),
                _ => tracing::debug!(path = %path.display(), "skipping card with invalid name"),
            }
        }
        roles.sort();
        Ok(roles)
    }
}

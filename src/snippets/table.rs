//! In-memory snippet table backed by a YAML file.
//!
//! The table is an immutable snapshot behind a pointer swap. Readers clone
//! the current `Arc` and never see a half-applied refresh; the writer builds
//! the next snapshot off-lock and only holds the write lock for the swap.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::error::SnippetError;

/// One `{id, text}` record of the snippet source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetEntry {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct RawSnippet {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Parse a snippet source. Records missing `id` or `text` are skipped.
///
/// An empty document is an empty table; anything other than a sequence at
/// the top level is an error.
pub fn parse_snippets(content: &str) -> Result<Vec<SnippetEntry>, SnippetError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<serde_yaml::Value> = serde_yaml::from_str(content)?;
    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_yaml::from_value::<RawSnippet>(record) {
            Ok(RawSnippet {
                id: Some(id),
                text: Some(text),
            }) => entries.push(SnippetEntry { id, text }),
            Ok(raw) => tracing::warn!(
                index,
                has_id = raw.id.is_some(),
                has_text = raw.text.is_some(),
                "skipping snippet record without id or text"
            ),
            Err(e) => tracing::warn!(index, error = %e, "skipping malformed snippet record"),
        }
    }
    Ok(entries)
}

/// Shared snippet lookup table. Share it as `Arc<SnippetTable>`.
#[derive(Debug)]
pub struct SnippetTable {
    source: PathBuf,
    snapshot: RwLock<Arc<HashMap<String, String>>>,
    /// Serializes writers so two refreshes can never interleave their merges.
    writer: Mutex<()>,
}

impl SnippetTable {
    /// Load the table from `source`. Any read or parse failure is returned
    /// to the caller; the service treats it as fatal at startup.
    pub fn initialize(source: impl Into<PathBuf>) -> Result<Self, SnippetError> {
        let source = source.into();
        let content = std::fs::read_to_string(&source).map_err(|e| SnippetError::Io {
            path: source.clone(),
            source: e,
        })?;
        let entries = parse_snippets(&content)?;
        let table = Self::from_entries(source, entries);
        tracing::info!(
            path = %table.source.display(),
            snippets = table.len(),
            "snippet table loaded"
        );
        Ok(table)
    }

    /// Build a table from already-parsed entries. Later duplicates win.
    pub fn from_entries(source: impl Into<PathBuf>, entries: Vec<SnippetEntry>) -> Self {
        let map = entries.into_iter().map(|e| (e.id, e.text)).collect();
        Self {
            source: source.into(),
            snapshot: RwLock::new(Arc::new(map)),
            writer: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Current snapshot. Stays consistent even if a refresh lands meanwhile.
    pub fn snapshot(&self) -> Arc<HashMap<String, String>> {
        self.snapshot.read().clone()
    }

    pub fn lookup(&self, id: &str) -> Option<String> {
        self.snapshot.read().get(id).cloned()
    }

    /// Like [`lookup`](Self::lookup) but with a typed not-found error.
    pub fn get(&self, id: &str) -> Result<String, SnippetError> {
        self.lookup(id)
            .ok_or_else(|| SnippetError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upsert `entries` into a new snapshot and swap it in.
    ///
    /// Ids absent from `entries` are kept. Returns the number of entries
    /// applied.
    pub fn merge(&self, entries: Vec<SnippetEntry>) -> usize {
        let _writer = self.writer.lock();
        let applied = entries.len();

        let mut next = (*self.snapshot()).clone();
        next.extend(entries.into_iter().map(|e| (e.id, e.text)));

        *self.snapshot.write() = Arc::new(next);
        applied
    }

    /// Re-read and re-parse the source, then merge it in.
    ///
    /// On error the table is left exactly as it was.
    pub async fn reload(&self) -> Result<usize, SnippetError> {
        let content = tokio::fs::read_to_string(&self.source)
            .await
            .map_err(|e| SnippetError::Io {
                path: self.source.clone(),
                source: e,
            })?;
        let entries = parse_snippets(&content)?;
        Ok(self.merge(entries))
    }
}

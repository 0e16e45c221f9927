//! Snippet table errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnippetError {
    /// The snippet source could not be read.
    #[error("failed to read snippet source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snippet source is not a YAML sequence of records.
    #[error("invalid snippet source: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// No snippet with this id.
    #[error("snippet '{0}' not found")]
    NotFound(String),

    /// The file watcher could not be started.
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

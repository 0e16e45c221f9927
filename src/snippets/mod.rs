//! Hot-reloadable snippet lookup table.
//!
//! # Lifecycle
//!
//! 1. [`SnippetTable::initialize`] loads the source at boot; failure is fatal.
//! 2. [`SnippetWatcher::spawn`] starts the background refresh task.
//! 3. Handlers call [`SnippetTable::lookup`] concurrently with refreshes.
//!
//! Refreshes merge (upsert) the re-parsed source into the table. Ids that
//! disappear from the file stay until restart.

pub mod error;
pub mod table;
pub mod watcher;

pub use error::SnippetError;
pub use table::{parse_snippets, SnippetEntry, SnippetTable};
pub use watcher::{watch_and_refresh, ChangeType, SnippetWatcher};

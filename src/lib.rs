//! # persona-rp
//!
//! A small role-play HTTP service. Persona cards are YAML files mapping moods
//! to reply templates; an incoming message is classified by keyword into a
//! mood and answered with the matching template. A snippet table loaded from
//! YAML is kept fresh by a background file watcher, and user events are
//! appended to a YAML log.

pub mod character;
pub mod config;
pub mod event_log;
pub mod mood;
pub mod reply;
pub mod server;
pub mod snippets;

pub use character::{CharacterStore, PersonaDefinition};
pub use config::ServerConfig;
pub use mood::{classify, Mood};
pub use reply::compose;
pub use snippets::{SnippetTable, SnippetWatcher};

/// Crate version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Persona cards: schema, validation and the directory-backed store.

pub mod definition;
pub mod error;
pub mod store;

pub use definition::{PersonaDefinition, TemplateSet};
pub use error::CharacterError;
pub use store::{is_valid_identifier, CharacterStore};

//! Mood-keyed reply composition.

pub mod composer;
pub mod template;

pub use composer::{compose, select_template};
pub use template::{render, TemplateError};

//! Reply composition: pick a template for the mood and render it.

use rand::seq::SliceRandom;
use rand::Rng;

use super::template::{render, TemplateError, PASSTHROUGH_TEMPLATE};
use crate::character::PersonaDefinition;
use crate::mood::Mood;

/// Choose the template for `mood`.
///
/// Falls back to the neutral templates, then to [`PASSTHROUGH_TEMPLATE`].
/// When several candidates exist one is drawn uniformly from `rng`.
pub fn select_template<'a, R: Rng + ?Sized>(
    persona: &'a PersonaDefinition,
    mood: Mood,
    rng: &mut R,
) -> &'a str {
    persona
        .templates_for(mood)
        .or_else(|| persona.templates_for(Mood::Neutral))
        .and_then(|set| set.candidates().choose(rng))
        .map(String::as_str)
        .unwrap_or(PASSTHROUGH_TEMPLATE)
}

/// Compose the persona's reply to `message`.
pub fn compose<R: Rng + ?Sized>(
    persona: &PersonaDefinition,
    mood: Mood,
    message: &str,
    rng: &mut R,
) -> Result<String, TemplateError> {
    let template = select_template(persona, mood, rng);
    render(template, &persona.display_name, message)
}

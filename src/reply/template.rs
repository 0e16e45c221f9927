//! Reply template rendering.
//!
//! Templates use `{name}` and `{msg}` placeholders. `{{` and `}}` produce
//! literal braces. Any other placeholder or a stray brace is an error and
//! nothing is rendered.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Tokens: escaped braces, a `{...}` placeholder, or a lone brace.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").unwrap());

/// Placeholder replaced by the persona's display name.
pub const NAME_PLACEHOLDER: &str = "name";

/// Placeholder replaced by the raw user message.
pub const MSG_PLACEHOLDER: &str = "msg";

/// Template that echoes the message unchanged.
pub const PASSTHROUGH_TEMPLATE: &str = "{msg}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template references unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder { placeholder: String },

    #[error("template has an unbalanced '{brace}' at byte {offset}")]
    UnbalancedBrace { brace: char, offset: usize },
}

/// Render `template` with the two supported placeholders.
pub fn render(template: &str, name: &str, msg: &str) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + msg.len());
    let mut last = 0;

    for caps in TOKEN.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        match (whole.as_str(), caps.get(1).map(|m| m.as_str())) {
            ("{{", _) => out.push('{'),
            ("}}", _) => out.push('}'),
            (_, Some(NAME_PLACEHOLDER)) => out.push_str(name),
            (_, Some(MSG_PLACEHOLDER)) => out.push_str(msg),
            (_, Some(other)) => {
                return Err(TemplateError::UnknownPlaceholder {
                    placeholder: other.to_string(),
                });
            }
            (brace, None) => {
                return Err(TemplateError::UnbalancedBrace {
                    brace: brace.chars().next().unwrap_or('{'),
                    offset: whole.start(),
                });
            }
        }
    }

    out.push_str(&template[last..]);
    Ok(out)
}

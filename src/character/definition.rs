//! Persona card schema.
//!
//! Cards are YAML documents with a `basic_info` block (display name) and a
//! `speech_patterns` block mapping mood labels to one template or a list of
//! candidate templates:
//!
//! ```yaml
//! basic_info:
//!   name: Lazul
//! speech_patterns:
//!   neutral: "{msg}"
//!   happy: ["{name} smiles. {msg}", "{name} laughs. {msg}"]
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::error::CharacterError;
use crate::mood::Mood;

/// A single template or an ordered list of candidates for one mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateSet {
    One(String),
    Many(Vec<String>),
}

impl TemplateSet {
    /// Candidate templates in declaration order.
    pub fn candidates(&self) -> &[String] {
        match self {
            TemplateSet::One(t) => std::slice::from_ref(t),
            TemplateSet::Many(list) => list,
        }
    }
}

/// A validated, immutable persona definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaDefinition {
    pub id: String,
    pub display_name: String,
    pub reply_templates: HashMap<Mood, TemplateSet>,
}

impl PersonaDefinition {
    /// Templates for `mood`, if the card defines any.
    pub fn templates_for(&self, mood: Mood) -> Option<&TemplateSet> {
        self.reply_templates.get(&mood)
    }

    /// Parse and validate a card. `id` is only used for error reporting and
    /// as the definition's key.
    pub fn from_yaml(id: &str, content: &str) -> Result<Self, CharacterError> {
        let raw: RawCard =
            serde_yaml::from_str(content).map_err(|e| CharacterError::MalformedPersona {
                id: id.to_string(),
                field: "<document>".to_string(),
                detail: Some(e.to_string()),
            })?;
        raw.validate(id)
    }
}

// ============================================================================
// On-disk shape
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawCard {
    #[serde(default)]
    basic_info: Option<RawBasicInfo>,
    #[serde(default)]
    speech_patterns: Option<BTreeMap<String, Option<TemplateSet>>>,
}

#[derive(Debug, Deserialize)]
struct RawBasicInfo {
    #[serde(default)]
    name: Option<String>,
}

impl RawCard {
    fn validate(self, id: &str) -> Result<PersonaDefinition, CharacterError> {
        let info = self
            .basic_info
            .ok_or_else(|| CharacterError::malformed(id, "basic_info"))?;
        let display_name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| CharacterError::malformed(id, "basic_info.name"))?;
        let patterns = self
            .speech_patterns
            .ok_or_else(|| CharacterError::malformed(id, "speech_patterns"))?;

        let mut reply_templates = HashMap::new();
        for (label, set) in patterns {
            let Some(mood) = Mood::from_label(&label) else {
                tracing::debug!(character = id, label = %label, "ignoring unknown mood label");
                continue;
            };
            // An empty key (`angry:`) counts as absent.
            let Some(set) = set else {
                tracing::debug!(character = id, label = %label, "ignoring empty mood entry");
                continue;
            };
            if set.candidates().is_empty() {
                return Err(CharacterError::malformed(
                    id,
                    format!("speech_patterns.{label}"),
                ));
            }
            reply_templates.insert(mood, set);
        }

        if !reply_templates.contains_key(&Mood::Neutral) {
            return Err(CharacterError::malformed(id, "speech_patterns.neutral"));
        }

        Ok(PersonaDefinition {
            id: id.to_string(),
            display_name,
            reply_templates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_field(result: Result<PersonaDefinition, CharacterError>) -> String {
        match result {
            Err(CharacterError::MalformedPersona { field, .. }) => field,
            other => panic!("expected MalformedPersona, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_full_card() {
        let yaml = r#"
basic_info:
  name: Lazul
  age: 19
speech_patterns:
  neutral: "{msg}"
  happy:
    - "{name} smiles. {msg}"
    - "{name} laughs. {msg}"
  angry: "{name} glares. {msg}"
"#;
        let def = PersonaDefinition::from_yaml("lazul", yaml).unwrap();
        assert_eq!(def.id, "lazul");
        assert_eq!(def.display_name, "Lazul");
        assert_eq!(
            def.templates_for(Mood::Neutral),
            Some(&TemplateSet::One("{msg}".into()))
        );
        assert_eq!(def.templates_for(Mood::Happy).unwrap().candidates().len(), 2);
        assert_eq!(
            def.templates_for(Mood::Angry).unwrap().candidates(),
            ["{name} glares. {msg}".to_string()]
        );
    }

    #[test]
    fn test_unknown_mood_is_ignored() {
        let yaml = r#"
basic_info: { name: Chacha }
speech_patterns:
  neutral: "{msg}"
  sleepy: "zzz"
"#;
        let def = PersonaDefinition::from_yaml("chacha", yaml).unwrap();
        assert_eq!(def.reply_templates.len(), 1);
    }

    #[test]
    fn test_missing_basic_info() {
        let yaml = "speech_patterns:\n  neutral: \"{msg}\"\n";
        assert_eq!(missing_field(PersonaDefinition::from_yaml("x", yaml)), "basic_info");
    }

    #[test]
    fn test_missing_name() {
        let yaml = "basic_info: {}\nspeech_patterns:\n  neutral: \"{msg}\"\n";
        assert_eq!(
            missing_field(PersonaDefinition::from_yaml("x", yaml)),
            "basic_info.name"
        );
    }

    #[test]
    fn test_missing_speech_patterns() {
        let yaml = "basic_info:\n  name: X\n";
        assert_eq!(
            missing_field(PersonaDefinition::from_yaml("x", yaml)),
            "speech_patterns"
        );
    }

    #[test]
    fn test_missing_neutral() {
        let yaml = "basic_info:\n  name: X\nspeech_patterns:\n  happy: \"yay {msg}\"\n";
        assert_eq!(
            missing_field(PersonaDefinition::from_yaml("x", yaml)),
            "speech_patterns.neutral"
        );
    }

    #[test]
    fn test_null_mood_entry_is_absent() {
        let yaml = "basic_info:\n  name: X\nspeech_patterns:\n  neutral: \"{msg}\"\n  angry: ~\n  happy:\n";
        let def = PersonaDefinition::from_yaml("x", yaml).unwrap();
        assert!(def.templates_for(Mood::Angry).is_none());
        assert!(def.templates_for(Mood::Happy).is_none());
        assert!(def.templates_for(Mood::Neutral).is_some());
    }

    #[test]
    fn test_null_neutral_is_missing() {
        let yaml = "basic_info:\n  name: X\nspeech_patterns:\n  neutral: ~\n  happy: \"yay {msg}\"\n";
        assert_eq!(
            missing_field(PersonaDefinition::from_yaml("x", yaml)),
            "speech_patterns.neutral"
        );
    }

    #[test]
    fn test_empty_candidate_list() {
        let yaml = "basic_info:\n  name: X\nspeech_patterns:\n  neutral: \"{msg}\"\n  happy: []\n";
        assert_eq!(
            missing_field(PersonaDefinition::from_yaml("x", yaml)),
            "speech_patterns.happy"
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let err = PersonaDefinition::from_yaml("x", "basic_info: [unclosed").unwrap_err();
        assert!(err.to_string().contains("<document>"));
    }
}

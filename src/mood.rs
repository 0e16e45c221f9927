//! Keyword-based mood detection.
//!
//! A message is lower-cased and scanned for angry keywords first, then happy
//! keywords. Anything else is neutral. Angry wins when both sets match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse mood label attached to an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Angry,
    Happy,
    Neutral,
}

impl Mood {
    /// All labels, in classification order.
    pub const ALL: [Mood; 3] = [Mood::Angry, Mood::Happy, Mood::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Angry => "angry",
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
        }
    }

    /// Parse a label as written in persona files (`"angry"`, `"happy"`, `"neutral"`).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == label)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords that mark a message as angry.
pub const ANGRY_KEYWORDS: &[&str] = &["angry", "mad", "怒", "生氣"];

/// Keywords that mark a message as happy.
pub const HAPPY_KEYWORDS: &[&str] = &["happy", "love", "開心", "喜"];

/// Classify a message. Total over all inputs; the empty string is neutral.
pub fn classify(message: &str) -> Mood {
    let low = message.to_lowercase();
    let rules: [(&[&str], Mood); 2] = [(ANGRY_KEYWORDS, Mood::Angry), (HAPPY_KEYWORDS, Mood::Happy)];

    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| low.contains(k)))
        .map(|(_, mood)| *mood)
        .unwrap_or(Mood::Neutral)
}

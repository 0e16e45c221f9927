//! Server configuration from environment variables.
//!
//! | Variable               | Default         |
//! |------------------------|-----------------|
//! | `PORT`                 | `8000`          |
//! | `RP_CHARACTER_DIR`     | `characters`    |
//! | `RP_DEFAULT_CHARACTER` | `default`       |
//! | `RP_SNIPPET_FILE`      | `snippets.yaml` |
//! | `RP_EVENT_FILE`        | `events.yaml`   |
//! | `RP_CACHE_PERSONAS`    | `false`         |

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub character_dir: PathBuf,
    pub default_character: String,
    pub snippet_file: PathBuf,
    pub event_file: PathBuf,
    pub cache_personas: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            character_dir: PathBuf::from("characters"),
            default_character: "default".to_string(),
            snippet_file: PathBuf::from("snippets.yaml"),
            event_file: PathBuf::from("events.yaml"),
            cache_personas: false,
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: port.clone(),
                reason: "expected a port number",
            })?;
        }
        if let Some(dir) = lookup("RP_CHARACTER_DIR") {
            config.character_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("RP_DEFAULT_CHARACTER") {
            config.default_character = name;
        }
        if let Some(file) = lookup("RP_SNIPPET_FILE") {
            config.snippet_file = PathBuf::from(file);
        }
        if let Some(file) = lookup("RP_EVENT_FILE") {
            config.event_file = PathBuf::from(file);
        }
        if let Some(flag) = lookup("RP_CACHE_PERSONAS") {
            config.cache_personas = parse_bool(&flag).ok_or(ConfigError::Invalid {
                var: "RP_CACHE_PERSONAS",
                value: flag.clone(),
                reason: "expected true/false",
            })?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

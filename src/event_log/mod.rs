//! Append-only event log stored as a YAML sequence.
//!
//! Every append rewrites the whole file; appends are serialized through an
//! async mutex so concurrent requests never lose records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("event log IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event log is not a YAML list of events: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One logged user event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub user: String,
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event stamped with the current time.
    pub async fn append(&self, user: &str, event: &str) -> Result<EventRecord, EventLogError> {
        let record = EventRecord {
            user: user.to_string(),
            event: event.to_string(),
            timestamp: Utc::now(),
        };

        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record.clone());
        let yaml = serde_yaml::to_string(&records)?;
        tokio::fs::write(&self.path, yaml)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(user, event, total = records.len(), "event logged");
        Ok(record)
    }

    /// All events in append order. A missing or empty file is an empty log.
    pub async fn list(&self) -> Result<Vec<EventRecord>, EventLogError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn read_all(&self) -> Result<Vec<EventRecord>, EventLogError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn io_error(&self, source: std::io::Error) -> EventLogError {
        EventLogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

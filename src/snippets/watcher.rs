//! Background refresh of the snippet table on file changes.
//!
//! A `notify` watcher on the source's parent directory forwards change
//! events for the source file into an mpsc channel. A single tokio task
//! drains the channel and reloads the table, so refreshes are applied in
//! the order events arrive and there is exactly one writer.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::error::SnippetError;
use super::table::SnippetTable;

/// Capacity of the change-event channel. Bursts beyond this are dropped;
/// a queued event already guarantees a reload.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Modified,
    Created,
    Deleted,
}

impl ChangeType {
    fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeType::Created),
            EventKind::Modify(_) => Some(ChangeType::Modified),
            EventKind::Remove(_) => Some(ChangeType::Deleted),
            _ => None,
        }
    }
}

/// Refresh loop. Runs until `shutdown` flips to `true` or every event
/// sender is dropped.
///
/// Failed reloads are logged and leave the table untouched; the loop keeps
/// going.
pub async fn watch_and_refresh(
    table: Arc<SnippetTable>,
    mut events: mpsc::Receiver<ChangeType>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(path = %table.source().display(), "snippet watcher started");

    loop {
        tokio::select! {
            change = events.recv() => {
                let Some(change) = change else {
                    tracing::debug!("snippet change channel closed");
                    break;
                };

                // Collapse a burst of events into one reload.
                let mut coalesced = 0usize;
                while events.try_recv().is_ok() {
                    coalesced += 1;
                }

                match table.reload().await {
                    Ok(applied) => tracing::info!(
                        ?change,
                        coalesced,
                        applied,
                        total = table.len(),
                        "snippet table refreshed"
                    ),
                    Err(e) => tracing::warn!(
                        ?change,
                        error = %e,
                        "snippet refresh failed, keeping previous table"
                    ),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("snippet watcher stopped");
}

/// Handle to a running snippet watcher.
///
/// Owns the `notify` watcher and the refresh task; call
/// [`SnippetWatcher::shutdown`] to stop both.
pub struct SnippetWatcher {
    watcher: RecommendedWatcher,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SnippetWatcher {
    /// Start watching `table`'s source file. Must be called inside a tokio
    /// runtime.
    pub fn spawn(table: Arc<SnippetTable>) -> Result<Self, SnippetError> {
        let source = table.source().to_path_buf();
        let file_name: OsString = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        // Watch the directory so editors that replace the file are still seen.
        let dir = match source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        let (tx, rx) = mpsc::channel::<ChangeType>(EVENT_BUFFER);
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let Some(change) = ChangeType::from_kind(&event.kind) else {
                        return;
                    };
                    let touches_source = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if touches_source {
                        // try_send keeps the notify thread from blocking.
                        if let Err(e) = tx.try_send(change) {
                            tracing::debug!("snippet change dropped: {}", e);
                        }
                    }
                }
                Err(e) => tracing::warn!("snippet watcher notify error: {}", e),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(watch_and_refresh(table, rx, shutdown_rx));

        Ok(Self {
            watcher,
            shutdown,
            task,
        })
    }

    /// Stop the refresh task and release the file watch.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        drop(self.watcher);
        if let Err(e) = self.task.await {
            tracing::warn!("snippet watcher task ended abnormally: {}", e);
        }
    }
}

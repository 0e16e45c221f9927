//! persona-rp HTTP server binary.
//!
//! Loads the snippet table (fatal on failure), starts the snippet file
//! watcher and serves the role-play API until Ctrl-C.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8000)
//! - `RP_CHARACTER_DIR` - persona card directory (default: `characters`)
//! - `RP_DEFAULT_CHARACTER` - persona used when a request names none (default: `default`)
//! - `RP_SNIPPET_FILE` - snippet source (default: `snippets.yaml`)
//! - `RP_EVENT_FILE` - event log (default: `events.yaml`)
//! - `RP_CACHE_PERSONAS` - cache loaded cards until restart (default: false)
//! - `RUST_LOG` - Tracing filter (default: "info,persona_rp=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use persona_rp::server::{app_router, AppState};
use persona_rp::{ServerConfig, SnippetTable, SnippetWatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,persona_rp=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let snippets = SnippetTable::initialize(&config.snippet_file)
        .map(Arc::new)
        .with_context(|| {
            format!(
                "failed to load snippet table from {}",
                config.snippet_file.display()
            )
        })?;
    let watcher =
        SnippetWatcher::spawn(Arc::clone(&snippets)).context("failed to start snippet watcher")?;

    let state = AppState::from_config(&config, snippets);
    let app = app_router(state);

    let bind_addr = config.bind_addr();
    tracing::info!("persona-rp server starting on {}", bind_addr);
    tracing::info!("Characters: {}", config.character_dir.display());
    tracing::info!("Endpoints:");
    tracing::info!("  POST /rp/respond    - in-character reply");
    tracing::info!("  GET  /rp/list_roles - available personas");
    tracing::info!("  POST /rp/snippet    - snippet lookup");
    tracing::info!("  GET  /health        - liveness check");
    tracing::info!("  POST /event/log, GET /event/list - event log");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("shutdown requested");
        })
        .await
        .context("server failed")?;

    watcher.shutdown().await;
    Ok(())
}

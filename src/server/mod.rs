//! HTTP server for the role-play service.
//!
//! # Endpoints
//!
//! - `POST /rp/respond`    - In-character reply
//! - `GET  /rp/list_roles` - Available persona ids
//! - `POST /rp/snippet`    - Snippet lookup
//! - `GET  /health`        - Liveness check
//! - `POST /event/log`, `GET /event/list` - Event log

pub mod error;
pub mod routes;

pub use error::{ApiError, ApiJson};
pub use routes::{app_router, AppState};

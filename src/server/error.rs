//! Mapping of library errors onto JSON HTTP responses.
//!
//! Body shape: `{"error": {"kind": "persona_not_found", "message": "..."}}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::character::CharacterError;
use crate::event_log::EventLogError;
use crate::reply::TemplateError;
use crate::snippets::SnippetError;

/// JSON body extractor whose rejections use the [`ApiError`] body shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body was missing, not JSON, or the wrong shape.
    #[error("invalid request: {}", .0.body_text())]
    BadRequest(#[from] JsonRejection),

    #[error(transparent)]
    Character(#[from] CharacterError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Snippet(#[from] SnippetError),

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Character(CharacterError::InvalidIdentifier(_)) => "invalid_identifier",
            ApiError::Character(CharacterError::PersonaNotFound(_)) => "persona_not_found",
            ApiError::Character(CharacterError::MalformedPersona { .. }) => "malformed_persona",
            ApiError::Character(CharacterError::Io(_)) => "storage_error",
            ApiError::Template(_) => "template_format_error",
            ApiError::Snippet(SnippetError::NotFound(_)) => "snippet_not_found",
            ApiError::Snippet(_) => "snippet_source_error",
            ApiError::EventLog(_) => "event_log_error",
            ApiError::Task(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(rejection) => rejection.status(),
            ApiError::Character(CharacterError::InvalidIdentifier(_)) => StatusCode::BAD_REQUEST,
            ApiError::Character(CharacterError::PersonaNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Snippet(SnippetError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "request rejected");
        }

        let body = Json(serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

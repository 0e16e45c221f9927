//! Axum route handlers for the role-play server.
//!
//! # Routes
//!
//! - `POST /rp/respond`     - Reply as one character, or several via `characters`
//! - `GET  /rp/list_roles`  - Ids of all persona cards on disk
//! - `POST /rp/snippet`     - Look up a snippet by `snippetId`
//! - `GET  /rp/health`      - Liveness check (also served at `/health`)
//! - `POST /event/log`      - Append a user event
//! - `GET  /event/list`     - All logged events

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::{ApiError, ApiJson};
use crate::character::{CharacterError, CharacterStore, PersonaDefinition};
use crate::config::ServerConfig;
use crate::event_log::{EventLog, EventRecord};
use crate::mood::{classify, Mood};
use crate::reply::compose;
use crate::snippets::SnippetTable;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Persona card store.
    pub characters: CharacterStore,
    /// Hot-reloaded snippet table (written only by the watcher task).
    pub snippets: Arc<SnippetTable>,
    /// Event log file.
    pub events: Arc<EventLog>,
    /// Persona used when a request names none.
    pub default_character: Arc<str>,
}

impl AppState {
    pub fn new(
        characters: CharacterStore,
        snippets: Arc<SnippetTable>,
        events: EventLog,
        default_character: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            characters,
            snippets,
            events: Arc::new(events),
            default_character: default_character.into(),
        }
    }

    /// Build state from configuration around an already-loaded snippet table.
    pub fn from_config(config: &ServerConfig, snippets: Arc<SnippetTable>) -> Self {
        let mut characters = CharacterStore::new(&config.character_dir);
        if config.cache_personas {
            characters = characters.with_cache();
        }
        Self::new(
            characters,
            snippets,
            EventLog::new(&config.event_file),
            config.default_character.as_str(),
        )
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    let rp = Router::new()
        .route("/respond", post(respond_handler))
        .route("/list_roles", get(list_roles_handler))
        .route("/snippet", post(snippet_handler))
        .route("/health", get(health_handler));

    let event = Router::new()
        .route("/log", post(log_event_handler))
        .route("/list", get(list_events_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/rp", rp)
        .nest("/event", event)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub message: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub characters: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterReply {
    pub name: String,
    pub reply: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RespondResponse {
    Single {
        reply: String,
        mood: Mood,
        timestamp: DateTime<Utc>,
    },
    Multi {
        replies: Vec<CharacterReply>,
        mood: Mood,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetRequest {
    pub snippet_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetResponse {
    pub snippet_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub user: String,
    pub event: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health - liveness check.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "timestamp": Utc::now(),
    }))
}

/// Run a blocking character-store call off the async workers.
async fn with_store<T, F>(store: &CharacterStore, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&CharacterStore) -> Result<T, CharacterError> + Send + 'static,
{
    let store = store.clone();
    let result = tokio::task::spawn_blocking(move || f(&store)).await?;
    Ok(result?)
}

/// POST /rp/respond - reply in character.
///
/// With `characters` every listed persona replies to the same message and
/// the request fails as a whole if any of them cannot be loaded. Otherwise
/// `character` (or the configured default) replies alone.
async fn respond_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RespondRequest>,
) -> Result<Json<RespondResponse>, ApiError> {
    let mood = classify(&request.message);
    let multi = request.characters.is_some();

    let ids: Vec<String> = match (request.characters, request.character) {
        (Some(list), _) if !list.is_empty() => list,
        (_, Some(one)) => vec![one],
        _ => vec![state.default_character.to_string()],
    };

    let personas: Vec<PersonaDefinition> =
        with_store(&state.characters, move |store| store.load_many(&ids)).await?;

    let mut rng = rand::thread_rng();
    let mut replies = Vec::with_capacity(personas.len());
    for persona in &personas {
        let reply = compose(persona, mood, &request.message, &mut rng)?;
        replies.push(CharacterReply {
            name: persona.id.clone(),
            reply,
        });
    }
    tracing::debug!(%mood, characters = replies.len(), "composed replies");

    let timestamp = Utc::now();
    let response = if multi {
        RespondResponse::Multi {
            replies,
            mood,
            timestamp,
        }
    } else {
        let reply = replies.pop().map(|r| r.reply).unwrap_or_default();
        RespondResponse::Single {
            reply,
            mood,
            timestamp,
        }
    };
    Ok(Json(response))
}

/// GET /rp/list_roles - persona ids available on disk.
async fn list_roles_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let roles = with_store(&state.characters, |store| store.list_roles()).await?;
    Ok(Json(serde_json::json!({ "roles": roles })))
}

/// POST /rp/snippet - snippet lookup.
async fn snippet_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SnippetRequest>,
) -> Result<Json<SnippetResponse>, ApiError> {
    let text = state.snippets.get(&request.snippet_id)?;
    Ok(Json(SnippetResponse {
        snippet_id: request.snippet_id,
        text,
    }))
}

/// POST /event/log - append a user event.
async fn log_event_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EventRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record: EventRecord = state.events.append(&request.user, &request.event).await?;
    Ok(Json(serde_json::json!({
        "status": "logged",
        "event": record,
    })))
}

/// GET /event/list - every logged event.
async fn list_events_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let events = state.events.list().await?;
    Ok(Json(serde_json::json!({ "events": events })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippets::SnippetEntry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const LAZUL: &str = r#"
basic_info:
  name: Lazul
speech_patterns:
  neutral: "{msg}"
  angry: "{name} frowns. {msg}"
"#;

    const CHACHA: &str = r#"
basic_info:
  name: Chacha
speech_patterns:
  neutral: "{msg}"
  happy: "{name} beams! {msg}"
"#;

    fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let cards = dir.path().join("characters");
        std::fs::create_dir(&cards).unwrap();
        std::fs::write(cards.join("lazul.yaml"), LAZUL).unwrap();
        std::fs::write(cards.join("chacha.yaml"), CHACHA).unwrap();
        std::fs::write(cards.join("broken.yaml"), "basic_info:\n  name: B\n").unwrap();
        std::fs::write(
            cards.join("typo.yaml"),
            "basic_info:\n  name: T\nspeech_patterns:\n  neutral: \"{nmae} {msg}\"\n",
        )
        .unwrap();

        let snippets = SnippetTable::from_entries(
            dir.path().join("snippets.yaml"),
            vec![SnippetEntry {
                id: "s1".into(),
                text: "A".into(),
            }],
        );
        let state = AppState::new(
            CharacterStore::new(&cards),
            Arc::new(snippets),
            EventLog::new(dir.path().join("events.yaml")),
            "lazul",
        );
        (dir, state)
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = app_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, state) = test_state();
        for uri in ["/health", "/rp/health"] {
            let (status, json) = send(&state, get_request(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["status"], "ok");
            assert_eq!(json["version"], crate::VERSION);
            assert!(json["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn test_respond_default_character() {
        let (_dir, state) = test_state();
        let (status, json) =
            send(&state, post_json("/rp/respond", serde_json::json!({"message": "Hello"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"], "Hello");
        assert_eq!(json["mood"], "neutral");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_respond_uses_mood_template() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"message": "I'm ANGRY", "character": "lazul"});
        let (status, json) = send(&state, post_json("/rp/respond", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"], "Lazul frowns. I'm ANGRY");
        assert_eq!(json["mood"], "angry");
    }

    #[tokio::test]
    async fn test_respond_multiple_characters() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"message": "Hi", "characters": ["lazul", "chacha"]});
        let (status, json) = send(&state, post_json("/rp/respond", body)).await;
        assert_eq!(status, StatusCode::OK);

        let replies: Vec<CharacterReply> =
            serde_json::from_value(json["replies"].clone()).unwrap();
        let names: Vec<_> = replies.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["lazul", "chacha"]);
        assert!(replies.iter().all(|r| r.reply == "Hi"));
    }

    #[tokio::test]
    async fn test_missing_character_returns_404() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"message": "Hi", "characters": ["lazul", "nonexist"]});
        let (status, json) = send(&state, post_json("/rp/respond", body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["kind"], "persona_not_found");
        assert!(json.get("replies").is_none());
    }

    #[tokio::test]
    async fn test_invalid_character_id_returns_400() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"message": "Hi", "character": "../etc/passwd"});
        let (status, json) = send(&state, post_json("/rp/respond", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["kind"], "invalid_identifier");
    }

    #[tokio::test]
    async fn test_malformed_character_returns_500() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"message": "Hi", "character": "broken"});
        let (status, json) = send(&state, post_json("/rp/respond", body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["kind"], "malformed_persona");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("speech_patterns"));
    }

    #[tokio::test]
    async fn test_bad_template_returns_500() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"message": "Hi", "character": "typo"});
        let (status, json) = send(&state, post_json("/rp/respond", body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["kind"], "template_format_error");
        assert!(json["error"]["message"].as_str().unwrap().contains("nmae"));
    }

    #[tokio::test]
    async fn test_list_roles() {
        let (_dir, state) = test_state();
        let (status, json) = send(&state, get_request("/rp/list_roles")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["roles"],
            serde_json::json!(["broken", "chacha", "lazul", "typo"])
        );
    }

    #[tokio::test]
    async fn test_snippet_lookup() {
        let (_dir, state) = test_state();
        let (status, json) =
            send(&state, post_json("/rp/snippet", serde_json::json!({"snippetId": "s1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"snippetId": "s1", "text": "A"}));

        let (status, json) =
            send(&state, post_json("/rp/snippet", serde_json::json!({"snippetId": "nope"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["kind"], "snippet_not_found");
    }

    #[tokio::test]
    async fn test_malformed_body_returns_json_error() {
        let (_dir, state) = test_state();
        let (status, json) =
            send(&state, post_json("/rp/snippet", serde_json::json!({"wrong": 1}))).await;
        assert!(status.is_client_error());
        assert_eq!(json["error"]["kind"], "invalid_request");
        assert!(json["error"]["message"].as_str().unwrap().contains("snippetId"));

        let (status, json) =
            send(&state, post_json("/rp/respond", serde_json::json!({"character": "lazul"}))).await;
        assert!(status.is_client_error());
        assert_eq!(json["error"]["kind"], "invalid_request");

        let request = Request::builder()
            .method("POST")
            .uri("/event/log")
            .body(Body::from("{}"))
            .unwrap();
        let (status, json) = send(&state, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json["error"]["kind"], "invalid_request");
    }

    #[tokio::test]
    async fn test_snippet_lookup_sees_refresh() {
        let (_dir, state) = test_state();
        state.snippets.merge(vec![SnippetEntry {
            id: "s1".into(),
            text: "B".into(),
        }]);
        let (_, json) =
            send(&state, post_json("/rp/snippet", serde_json::json!({"snippetId": "s1"}))).await;
        assert_eq!(json["text"], "B");
    }

    #[tokio::test]
    async fn test_event_log_roundtrip() {
        let (_dir, state) = test_state();
        let body = serde_json::json!({"user": "alice", "event": "opened door"});
        let (status, json) = send(&state, post_json("/event/log", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "logged");
        assert_eq!(json["event"]["user"], "alice");

        let (status, json) = send(&state, get_request("/event/list")).await;
        assert_eq!(status, StatusCode::OK);
        let events = json["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "opened door");
    }
}

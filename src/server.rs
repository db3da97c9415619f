//! HTTP server and the embedded single-page chat UI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Single-page chat UI |
//! | `POST` | `/chat` | Route one free-text interaction |
//! | `GET`  | `/faq` | Sidebar shortcuts and static links |
//! | `POST` | `/faq/shortcut` | Append a fixed FAQ pair to a session |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses are JSON:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `embeddings_disabled` (400), `internal` (500).
//!
//! # Sessions
//!
//! Sessions live in server memory, one transcript per session id,
//! independent across sessions. A request without a `session_id` creates a
//! new session; unknown ids are rejected with `not_found`. The store is
//! capped: once [`SESSION_CAP`] sessions exist, creating a new one drops
//! the least recently used transcript.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::chat::{self, ChatRequest, Followup, Session};
use crate::config::Config;
use crate::db;
use crate::faq::{self, FaqIndex};
use crate::intent::IntentIndex;
use crate::models::{ChatMessage, QaPair};

/// Upper bound on concurrently retained sessions. Beyond this the least
/// recently used transcript is evicted.
const SESSION_CAP: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(cap) => cap,
    None => panic!("session cap must be non-zero"),
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    faq: Arc<FaqIndex>,
    intents: Arc<IntentIndex>,
    sessions: Arc<Mutex<SessionStore>>,
}

/// In-memory session map with LRU eviction. Touching a session via
/// [`SessionStore::resolve`] or [`SessionStore::get_mut`] marks it as
/// recently used.
struct SessionStore {
    cache: LruCache<Uuid, Session>,
}

impl SessionStore {
    fn new(cap: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(cap),
        }
    }

    /// Fetch an existing session or create a fresh one when no id was sent.
    /// Unknown ids are a client error, not an implicit new session.
    fn resolve(&mut self, requested: Option<Uuid>) -> Result<&mut Session, AppError> {
        match requested {
            Some(id) => self
                .cache
                .get_mut(&id)
                .ok_or_else(|| not_found(format!("no session with id: {}", id))),
            None => {
                let session = Session::new();
                let id = session.id;
                self.cache.push(id, session);
                self.cache
                    .get_mut(&id)
                    .ok_or_else(|| internal("session store rejected a new session"))
            }
        }
    }

    fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        self.cache.get_mut(id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    fn contains(&self, id: &Uuid) -> bool {
        self.cache.contains(id)
    }
}

/// Starts the HTTP server.
///
/// Loads the FAQ dataset and embeds the reference sets up front — a
/// missing or malformed dataset, or a disabled embedding provider, is
/// fatal to startup. Binds to `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    if !config.embedding.is_enabled() {
        anyhow::bail!(
            "The chat service requires embeddings. Set [embedding] provider in config."
        );
    }

    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let faq_index = FaqIndex::build(config).await?;
    println!("FAQ dataset loaded: {} entries", faq_index.len());
    let intent_index = IntentIndex::build(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        faq: Arc::new(faq_index),
        intents: Arc::new(intent_index),
        sessions: Arc::new(Mutex::new(SessionStore::new(SESSION_CAP))),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/chat", post(handle_chat))
        .route("/faq", get(handle_faq_list))
        .route("/faq/shortcut", post(handle_faq_shortcut))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("aquabot listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if msg.contains("disabled") {
        AppError {
            status: StatusCode::BAD_REQUEST,
            code: "embeddings_disabled".to_string(),
            message: msg,
        }
    } else {
        internal(msg)
    }
}

// ============ GET / ============

async fn handle_index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatBody {
    session_id: Option<Uuid>,
    message: String,
    account: Option<String>,
    month: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: Uuid,
    messages: Vec<ChatMessage>,
    followup: Option<Followup>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, AppError> {
    if body.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    // Resolve the session under a short lock. Embedding and store lookups
    // below must not run while the session map is held, or every other
    // session's request serializes behind this one.
    let session_id = {
        let mut sessions = state.sessions.lock().await;
        sessions.resolve(body.session_id)?.id
    };

    let request = ChatRequest {
        message: body.message,
        account: body.account,
        month: body.month,
    };

    let reply = chat::route_message(
        &state.pool,
        &state.config,
        &state.faq,
        &state.intents,
        &request,
    )
    .await
    .map_err(classify_error)?;

    {
        let mut sessions = state.sessions.lock().await;
        // The session may have been evicted while routing ran; the reply
        // still goes back to the client, only the transcript entry is lost.
        if let Some(session) = sessions.get_mut(&session_id) {
            chat::append_exchange(session, &request.message, &reply);
        }
    }

    Ok(Json(ChatResponse {
        session_id,
        messages: reply.messages,
        followup: reply.followup,
    }))
}

// ============ GET /faq ============

#[derive(Serialize)]
struct FaqListResponse {
    shortcuts: Vec<QaPair>,
    links: Vec<LinkEntry>,
}

#[derive(Serialize)]
struct LinkEntry {
    label: String,
    url: String,
}

async fn handle_faq_list() -> Json<FaqListResponse> {
    Json(FaqListResponse {
        shortcuts: faq::sidebar_shortcuts(),
        links: faq::SIDEBAR_LINKS
            .iter()
            .map(|(label, url)| LinkEntry {
                label: label.to_string(),
                url: url.to_string(),
            })
            .collect(),
    })
}

// ============ POST /faq/shortcut ============

#[derive(Deserialize)]
struct ShortcutBody {
    session_id: Option<Uuid>,
    index: usize,
}

async fn handle_faq_shortcut(
    State(state): State<AppState>,
    Json(body): Json<ShortcutBody>,
) -> Result<Json<ChatResponse>, AppError> {
    let shortcuts = faq::sidebar_shortcuts();
    let pair = shortcuts
        .get(body.index)
        .ok_or_else(|| bad_request(format!("no FAQ shortcut at index {}", body.index)))?;

    // No embedding or store work here, so holding the lock for the append
    // is fine.
    let mut sessions = state.sessions.lock().await;
    let session = sessions.resolve(body.session_id)?;
    let session_id = session.id;

    chat::append_shortcut(session, &pair.question, &pair.answer);

    Ok(Json(ChatResponse {
        session_id,
        messages: vec![
            ChatMessage::user(&pair.question),
            ChatMessage::assistant(&pair.answer),
        ],
        followup: None,
    }))
}

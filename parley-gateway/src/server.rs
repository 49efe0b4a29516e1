use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parley_core::{ChatReply, ChatRequest, ClearRequest, KnowledgeRequest, StatusReply};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::state::AppState;

/// Root banner
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub knowledge_items: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Any handler failure, rendered as `500 {"detail": ...}`.
struct InternalError(String);

impl<E: std::fmt::Display> From<E> for InternalError {
    fn from(err: E) -> Self {
        Self(err.to_string())
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        error!("request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { detail: self.0 }),
        )
            .into_response()
    }
}

/// Run the HTTP server
pub async fn run(
    state: Arc<AppState>,
    bind_addr: &str,
    cors_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state, cors_origins);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/add-knowledge", post(add_knowledge_handler))
        .route("/clear", post(clear_handler))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS for the configured browser origins, any method and header.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "parley chat gateway".to_string(),
        status: "running".to_string(),
    })
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        knowledge_items: state.knowledge.len(),
    })
}

/// Chat handler - POST /chat
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, InternalError> {
    let response = state.chat(&request).await?;
    Ok(Json(ChatReply { response }))
}

/// POST /add-knowledge
async fn add_knowledge_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KnowledgeRequest>,
) -> Result<Json<StatusReply>, InternalError> {
    state.add_knowledge(&request.text).await?;
    Ok(Json(StatusReply::new("added", "Knowledge added successfully")))
}

/// POST /clear
async fn clear_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClearRequest>,
) -> Json<StatusReply> {
    state.clear(&request.user_id).await;
    Json(StatusReply::new("cleared", "Conversation history cleared"))
}

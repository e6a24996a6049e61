//! HTTP webhook receiver.
//!
//! Routes:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/webhook` | GitHub `issues` webhook deliveries |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/hooks` | Recent hook records (bounded) |
//!
//! The webhook handler receives the body as raw [`Bytes`] so the signature is
//! checked against exactly what GitHub sent.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nodes::TriageExecutor;
use pipeline::{QueuedIssue, TriageError, SIGNATURE_HEADER};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::hook_log::{HookLog, HookRecord};
use crate::queue::{MessageId, QueueError, QueueSender};

/// How admitted events are triaged.
#[derive(Debug, Clone)]
pub enum DeliveryMode {
    /// Classify and label before responding.
    Inline,
    /// Publish to the triage queue and respond immediately.
    Queued(QueueSender),
}

/// Server state shared across handlers.
pub struct ServerState {
    pub executor: Arc<TriageExecutor>,
    pub hook_log: Arc<HookLog>,
    pub mode: DeliveryMode,
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .route("/hooks", get(hooks_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn run_server<F>(
    state: Arc<ServerState>,
    addr: &str,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("LabelCat webhook server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueuedResponse {
    message_id: MessageId,
}

/// Maps pipeline errors onto HTTP statuses.
struct ApiError(TriageError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TriageError::Authorization => StatusCode::FORBIDDEN,
            TriageError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            TriageError::UpstreamService { .. } => StatusCode::BAD_GATEWAY,
            TriageError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

struct QueueUnavailable(QueueError);

impl IntoResponse for QueueUnavailable {
    fn into_response(self) -> Response {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn hooks_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.hook_log.snapshot())
}

async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match &state.mode {
        DeliveryMode::Inline => match state.executor.handle_webhook(&body, signature).await {
            Ok(outcome) => {
                state.hook_log.push(HookRecord::from_outcome(&outcome));
                (StatusCode::OK, Json(outcome)).into_response()
            }
            Err(err) => reject(&state, err),
        },
        DeliveryMode::Queued(sender) => {
            let admitted = match state.executor.admit(&body, signature) {
                Ok(admitted) => admitted,
                Err(err) => return reject(&state, err),
            };
            let message = QueuedIssue::from(&admitted);
            match sender.publish(&message) {
                Ok(message_id) => {
                    info!(%message_id, issue = %admitted.issue, "issue queued for triage");
                    state.hook_log.push(HookRecord::queued(
                        message.owner,
                        message.repo,
                        message.number,
                    ));
                    (StatusCode::OK, Json(QueuedResponse { message_id })).into_response()
                }
                Err(err) => {
                    error!(error = %err, issue = %admitted.issue, "failed to queue issue");
                    QueueUnavailable(err).into_response()
                }
            }
        }
    }
}

fn reject(state: &ServerState, err: TriageError) -> Response {
    if let TriageError::Authorization = err {
        warn!("rejected webhook with invalid signature");
    }
    state.hook_log.push(HookRecord::from_error(&err));
    ApiError(err).into_response()
}

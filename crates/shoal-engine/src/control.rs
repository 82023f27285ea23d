//! Control and metrics HTTP surface.
//!
//! The presentation layer (or an operator with curl) drives the pond
//! through this small Axum server; Prometheus scrapes it. All state
//! mutation goes through the actor's command channel -- handlers never
//! touch the collection directly.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/healthz` | Liveness probe |
//! | `GET` | `/metrics` | Prometheus text exposition |
//! | `GET` | `/api/pond` | Current pond view (tick, stats, fish) |
//! | `POST` | `/api/spawn` | Spawn one local fish now |
//! | `POST` | `/api/release` | Release a local fish (optional id) |
//! | `PUT` | `/api/topic` | Change the outbound subject |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use serde::Deserialize;
use shoal_core::runner::{PondCommand, PondView};
use shoal_metrics::PondGauges;
use shoal_types::FishId;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tracing::info;

/// Errors that can occur when starting the control server.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),
}

/// Shared state for the control handlers.
#[derive(Clone)]
pub struct ControlState {
    /// The actor-refreshed read-only pond view.
    pub view: Arc<RwLock<PondView>>,
    /// Command channel into the pond actor.
    pub commands: mpsc::Sender<PondCommand>,
    /// The metric series for the scrape endpoint.
    pub gauges: PondGauges,
}

/// Body for `POST /api/release`.
#[derive(Debug, Default, Deserialize)]
pub struct ReleaseRequest {
    /// The fish to release; the first local fish when omitted.
    pub id: Option<String>,
}

/// Body for `PUT /api/topic`.
#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    /// The new outbound subject.
    pub topic: String,
}

/// Build the control router.
pub fn build_router(state: ControlState) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/pond", get(pond_view))
        .route("/api/spawn", post(spawn))
        .route("/api/release", post(release))
        .route("/api/topic", put(set_topic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the control server and serve it on a background task.
///
/// Binding happens before the task is spawned so address conflicts
/// surface as startup errors.
///
/// # Errors
///
/// Returns [`ControlError::Bind`] if the TCP listener cannot bind.
pub async fn spawn_control(
    port: u16,
    state: ControlState,
) -> Result<tokio::task::JoinHandle<()>, ControlError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ControlError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "control surface listening");
    let router = build_router(state);

    Ok(tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(%error, "control server stopped");
        }
    }))
}

/// `GET /healthz` -- liveness probe.
async fn healthz() -> &'static str {
    "ok"
}

/// `GET /metrics` -- Prometheus text exposition.
async fn metrics(State(state): State<ControlState>) -> Response {
    match state.gauges.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics rendering failed: {error}"),
        )
            .into_response(),
    }
}

/// `GET /api/pond` -- the actor's last published view.
async fn pond_view(State(state): State<ControlState>) -> Json<PondView> {
    Json(state.view.read().await.clone())
}

/// `POST /api/spawn` -- spawn one local fish now.
async fn spawn(State(state): State<ControlState>) -> StatusCode {
    submit(&state, PondCommand::SpawnLocal).await
}

/// `POST /api/release` -- release a local fish to the bus.
async fn release(
    State(state): State<ControlState>,
    body: Option<Json<ReleaseRequest>>,
) -> StatusCode {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let id = request.id.map(FishId::from);
    submit(&state, PondCommand::Release { id }).await
}

/// `PUT /api/topic` -- change the outbound subject.
async fn set_topic(
    State(state): State<ControlState>,
    Json(request): Json<TopicRequest>,
) -> StatusCode {
    submit(
        &state,
        PondCommand::SetTopic {
            topic: request.topic,
        },
    )
    .await
}

/// Submit a command to the actor; 503 when it is gone.
async fn submit(state: &ControlState, command: PondCommand) -> StatusCode {
    if state.commands.send(command).await.is_ok() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_state() -> (ControlState, mpsc::Receiver<PondCommand>) {
        let (commands, command_rx) = mpsc::channel(16);
        let state = ControlState {
            view: Arc::new(RwLock::new(PondView::new("shoal.pond"))),
            commands,
            gauges: PondGauges::new().unwrap(),
        };
        (state, command_rx)
    }

    #[tokio::test]
    async fn spawn_submits_command() {
        let (state, mut command_rx) = make_state();
        let status = spawn(State(state)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(command_rx.recv().await, Some(PondCommand::SpawnLocal));
    }

    #[tokio::test]
    async fn release_without_body_targets_first_local() {
        let (state, mut command_rx) = make_state();
        let status = release(State(state), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            command_rx.recv().await,
            Some(PondCommand::Release { id: None })
        );
    }

    #[tokio::test]
    async fn release_with_id_targets_that_fish() {
        let (state, mut command_rx) = make_state();
        let body = Json(ReleaseRequest {
            id: Some(String::from("NetLink_5")),
        });
        let status = release(State(state), Some(body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            command_rx.recv().await,
            Some(PondCommand::Release {
                id: Some(FishId::from("NetLink_5"))
            })
        );
    }

    #[tokio::test]
    async fn commands_after_actor_shutdown_are_rejected() {
        let (state, command_rx) = make_state();
        drop(command_rx);
        let status = spawn(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_series() {
        let (state, _command_rx) = make_state();
        let response = metrics(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

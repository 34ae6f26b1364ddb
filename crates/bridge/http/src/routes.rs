//! Axum routes for the bridge API

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use nfc_bridge_core::{Bridge, BridgeStatus, CardUid};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;

/// Shared handler state
#[derive(Debug, Clone)]
struct AppState {
    bridge: Arc<Bridge>,
    port: u16,
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Bridge snapshot
    #[serde(flatten)]
    pub status: BridgeStatus,
    /// Port the API listens on
    pub port: u16,
}

/// Body of `POST /bridge/toggle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleResponse {
    /// Bridge flag after the toggle
    pub enabled: bool,
}

/// Body of a successful `POST /nfc/wait`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UidResponse {
    /// Card identifier
    pub uid: CardUid,
}

/// Construct the bridge router with all endpoints
///
/// `port` is only reported back by `/health`.
pub fn router(bridge: Arc<Bridge>, port: u16) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/bridge/toggle", post(toggle))
        .route("/nfc/wait", post(wait_for_card));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { bridge, port })
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.bridge.status(),
        port: state.port,
    })
}

/// POST /bridge/toggle
async fn toggle(State(state): State<AppState>) -> Json<ToggleResponse> {
    Json(ToggleResponse {
        enabled: state.bridge.toggle(),
    })
}

/// POST /nfc/wait
///
/// Holds the connection open until a card arrives, the wait deadline passes
/// or the reader goes away.
async fn wait_for_card(State(state): State<AppState>) -> Result<Json<UidResponse>, ApiError> {
    let uid = state
        .bridge
        .wait_for_card()
        .await
        .inspect_err(|e| debug!(error = %e, "wait failed"))?;
    Ok(Json(UidResponse { uid }))
}

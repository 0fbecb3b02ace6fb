//! HTTP route handlers for the content server.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::bridge::ScriptLoad;
use crate::socket_server::protocol::now_timestamp;

use super::AppState;

const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

/// Body of `GET /health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub root_path: String,
}

/// GET `/health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: now_timestamp(),
        root_path: state.root_path.display().to_string(),
    })
}

/// GET `/__livespec/client.js` - the bridge script, prefixed with its
/// runtime settings.
pub async fn bridge_script(State(state): State<Arc<AppState>>) -> Response {
    match state.asset.load().await {
        ScriptLoad::Found { path, source } => {
            tracing::debug!("[HTTP] Serving bridge script from {}", path.display());
            let body = format!("{}{}", state.script.prelude(), source);
            (
                [
                    (header::CONTENT_TYPE, JAVASCRIPT),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                body,
            )
                .into_response()
        }
        ScriptLoad::NotFound { tried } => {
            tracing::error!("[HTTP] Bridge script not found, tried {:?}", tried);
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, JAVASCRIPT)],
                "// Bridge script not found",
            )
                .into_response()
        }
        ScriptLoad::ReadFailed { path, message } => {
            tracing::error!("[HTTP] Failed to read {}: {}", path.display(), message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, JAVASCRIPT)],
                "// Failed to load bridge script",
            )
                .into_response()
        }
    }
}

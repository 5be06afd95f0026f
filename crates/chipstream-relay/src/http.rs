//! HTTP surface: status endpoint and whitelisted static assets.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tracing::debug;

use crate::state::RelayState;
use crate::ws::ws_handler;

/// The only asset paths the relay will serve. Everything else is a 404;
/// there is no directory listing and no path mapping beyond this table.
const STATIC_WHITELIST: &[(&str, &str, &str)] = &[
    ("/", "index.html", "text/html; charset=utf-8"),
    ("/index.html", "index.html", "text/html; charset=utf-8"),
    ("/app.js", "app.js", "application/javascript"),
    ("/synth.js", "synth.js", "application/javascript"),
    ("/style.css", "style.css", "text/css"),
];

/// Build the relay's router: status, socket upgrade, static whitelist.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/ws", get(ws_handler))
        .fallback(static_asset)
        .with_state(state)
}

/// `GET /api/status`
async fn status(State(state): State<Arc<RelayState>>) -> Json<serde_json::Value> {
    Json(state.status())
}

/// Serve one whitelisted asset from the configured public directory.
async fn static_asset(State(state): State<Arc<RelayState>>, uri: Uri) -> Response {
    let path = uri.path();
    let Some((_, file, content_type)) = STATIC_WHITELIST
        .iter()
        .find(|(route, _, _)| *route == path)
    else {
        return not_found();
    };

    match tokio::fs::read(state.config().public_dir.join(file)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, *content_type)], bytes).into_response(),
        Err(error) => {
            debug!(%error, file, "whitelisted asset missing on disk");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

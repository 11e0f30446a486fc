use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::server::{AppState, now_ms};

pub const SERVICE_NAME: &str = "ytrelay";

/// GET /
pub async fn index() -> Json<Value> {
    tracing::debug!("GET /");
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health": "service health",
            "/info?url=": "video metadata and formats",
            "/formats?url=": "all formats grouped by quality",
            "/download?url=&quality=&itag=&filename=": "download a video stream",
            "/audio?url=": "download the best audio stream",
            "/stream?url=&itag=": "inline stream with Range support",
            "/thumbnail/{id}?quality=": "proxied thumbnail image",
            "/thumbnails?url=": "all thumbnail URLs",
            "/search?query=&limit=": "search videos"
        }
    }))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    tracing::trace!("GET /health");
    Json(json!({
        "status": "healthy",
        "timestamp": now_ms(),
        "service": SERVICE_NAME,
        "uptime_secs": state.uptime_secs(),
    }))
}

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{media, meta, search, video},
    },
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(meta::index))
        .route("/health", get(meta::health))
        .route("/info", get(video::info))
        .route("/formats", get(video::formats))
        .route("/thumbnails", get(video::thumbnails))
        .route("/download", get(media::download))
        .route("/audio", get(media::audio))
        .route("/stream", get(media::stream))
        .route("/thumbnail/{id}", get(media::thumbnail))
        .route("/search", get(search::search))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

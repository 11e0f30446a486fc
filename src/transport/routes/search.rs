use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};

use crate::{
    api::SearchQuery,
    common::RelayResult,
    server::AppState,
    sources::youtube::search::{SearchResponse, clamp_limit},
    transport::routes::query,
};

/// GET /search?query=...&limit=...
pub async fn search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> RelayResult<Json<SearchResponse>> {
    let params = query(params)?;
    let limit = clamp_limit(params.limit);
    tracing::debug!("GET /search query='{}' limit={}", params.query, limit);

    let response = state.youtube.search(&params.query, limit).await?;
    Ok(Json(response))
}

use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Json, Response},
};

use crate::{
    api::{FormatsListing, ThumbnailListing, UrlQuery, VideoInfo},
    common::RelayResult,
    server::AppState,
    transport::routes::query,
};

/// GET /info?url=...
pub async fn info(
    State(state): State<Arc<AppState>>,
    params: Result<Query<UrlQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    tracing::debug!("GET /info url={}", params.url);

    let data = state.youtube.load_video(&params.url).await?;
    Ok(Json(VideoInfo::new(&data)).into_response())
}

/// GET /formats?url=...
pub async fn formats(
    State(state): State<Arc<AppState>>,
    params: Result<Query<UrlQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    tracing::debug!("GET /formats url={}", params.url);

    let data = state.youtube.load_video(&params.url).await?;
    Ok(Json(FormatsListing::new(&data)).into_response())
}

/// GET /thumbnails?url=...
pub async fn thumbnails(
    State(state): State<Arc<AppState>>,
    params: Result<Query<UrlQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    tracing::debug!("GET /thumbnails url={}", params.url);

    let data = state.youtube.load_video(&params.url).await?;
    let defaults = state.youtube.default_thumbnails(&data.id);
    Ok(Json(ThumbnailListing::new(&data, defaults)).into_response())
}

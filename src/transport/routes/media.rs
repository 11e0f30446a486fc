use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, header},
    response::Response,
};

use crate::{
    api::{DownloadQuery, StreamQuery, ThumbnailQuery, UrlQuery},
    common::{RelayError, RelayResult},
    relay::Disposition,
    server::AppState,
    sources::youtube::{
        formats::{ResolvedStream, best_audio, find_itag, select},
        url::VideoId,
    },
    transport::routes::query,
};

const DEFAULT_THUMBNAIL_QUALITY: &str = "hq";

/// GET /download?url=...&quality=...&itag=...&filename=...
pub async fn download(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DownloadQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    tracing::debug!(
        "GET /download url={} quality={:?} itag={:?}",
        params.url,
        params.quality,
        params.itag
    );

    let data = state.youtube.load_video(&params.url).await?;
    let format = select(&data.formats, params.itag, params.quality.as_deref())?;
    let stream = state.youtube.resolve_stream(format)?;

    let filename = params.filename.unwrap_or_else(|| {
        format!(
            "{}_{}.{}",
            data.config.title().unwrap_or(data.id.as_str()),
            format.quality,
            format.extension()
        )
    });

    let label = format!("download {} itag {}", data.id, format.itag);
    relay(&state, &stream, None, Disposition::Attachment(filename), label).await
}

/// GET /audio?url=...
pub async fn audio(
    State(state): State<Arc<AppState>>,
    params: Result<Query<UrlQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    tracing::debug!("GET /audio url={}", params.url);

    let data = state.youtube.load_video(&params.url).await?;
    let format = best_audio(&data.formats)
        .ok_or_else(|| RelayError::FormatNotAvailable("no audio formats".to_string()))?;
    let stream = state.youtube.resolve_stream(format)?;

    let filename = format!(
        "{}.{}",
        data.config.title().unwrap_or(data.id.as_str()),
        format.extension()
    );
    let label = format!("audio {} itag {}", data.id, format.itag);
    relay(&state, &stream, None, Disposition::Attachment(filename), label).await
}

/// GET /stream?url=...&itag=...
///
/// Inline playback. A `Range` header is forwarded upstream and the partial
/// response relayed as-is.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<StreamQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    let range = headers.get(header::RANGE);
    tracing::debug!(
        "GET /stream url={} itag={:?} Range={:?}",
        params.url,
        params.itag,
        range
    );

    let data = state.youtube.load_video(&params.url).await?;
    let format = match params.itag {
        Some(itag) => find_itag(&data.formats, itag)
            .ok_or_else(|| RelayError::FormatNotAvailable(format!("itag {}", itag)))?,
        None => select(&data.formats, None, None)?,
    };
    let stream = state.youtube.resolve_stream(format)?;

    let label = format!("stream {} itag {}", data.id, format.itag);
    relay(&state, &stream, range, Disposition::Inline, label).await
}

/// GET /thumbnail/{id}?quality=...
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<ThumbnailQuery>, QueryRejection>,
) -> RelayResult<Response> {
    let params = query(params)?;
    let quality = params
        .quality
        .unwrap_or_else(|| DEFAULT_THUMBNAIL_QUALITY.to_string());
    tracing::debug!("GET /thumbnail/{} quality={}", id, quality);

    let id = VideoId::parse(&id)?;
    let url = state.youtube.thumbnail_url(&id, &quality)?;
    let upstream = state.proxy.open(&url, None).await?;
    Ok(upstream.into_response("", &Disposition::Inline, false, format!("thumbnail {}", id)))
}

async fn relay(
    state: &AppState,
    stream: &ResolvedStream,
    range: Option<&HeaderValue>,
    disposition: Disposition,
    label: String,
) -> RelayResult<Response> {
    if stream.signature_uncertain {
        tracing::warn!(
            "{}: URL built from a guessed signature transform, upstream may reject it",
            label
        );
    }

    let upstream = state.proxy.open(&stream.url, range).await?;
    tracing::info!(
        "{}: relaying {} ({:?} bytes declared)",
        label,
        stream.content_type,
        stream.content_length
    );
    Ok(upstream.into_response(
        &stream.content_type,
        &disposition,
        stream.signature_uncertain,
        label,
    ))
}

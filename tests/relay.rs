mod common;

use std::{
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use ytrelay::{
    common::RelayError,
    configs::RelayConfig,
    relay::{Disposition, StreamProxy},
};

const LEN: usize = 300_000;

async fn media(headers: HeaderMap) -> impl IntoResponse {
    let body = common::payload(LEN);
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.split_once('-'))
        .and_then(|(start, end)| Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?)));

    match range {
        Some((start, end)) => {
            let slice = body[start..=end].to_vec();
            let content_range = format!("bytes {}-{}/{}", start, end, LEN);
            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, "video/mp4".to_string()),
                    (header::CONTENT_RANGE, content_range),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                slice,
            )
                .into_response()
        }
        None => (
            [
                (header::CONTENT_TYPE, "video/mp4".to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            body,
        )
            .into_response(),
    }
}

async fn upstream() -> String {
    let router = Router::new()
        .route("/media", get(media))
        .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
        .route(
            "/partial",
            get(|| async { (StatusCode::PARTIAL_CONTENT, "partial") }),
        );
    common::spawn(router).await
}

fn proxy(chunk_size: usize) -> StreamProxy {
    StreamProxy::new(&RelayConfig {
        chunk_size,
        connect_timeout_secs: 5,
        response_timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_relayed_bytes_are_identical() {
    let base = upstream().await;
    let expected = common::payload(LEN);

    for chunk_size in [1024, 4096, 65_536, 1_000_000] {
        let upstream = proxy(chunk_size)
            .open(&format!("{}/media", base), None)
            .await
            .unwrap();
        assert_eq!(upstream.status, StatusCode::OK);
        assert_eq!(upstream.headers[header::CONTENT_LENGTH], LEN.to_string().as_str());

        let mut stream = upstream.into_stream("test");
        let mut received = Vec::with_capacity(LEN);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            assert!(chunk.len() <= chunk_size);
            received.extend_from_slice(&chunk);
        }
        assert_eq!(stream.relayed(), LEN as u64);
        assert!(received == expected, "chunk size {}", chunk_size);
    }
}

#[tokio::test]
async fn test_non_200_fails_before_streaming() {
    let base = upstream().await;

    let err = proxy(4096)
        .open(&format!("{}/forbidden", base), None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RelayError::UpstreamStatus(403)), "{err:?}");
}

#[tokio::test]
async fn test_partial_content_needs_a_range_request() {
    let base = upstream().await;

    let err = proxy(4096)
        .open(&format!("{}/partial", base), None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RelayError::UpstreamStatus(206)), "{err:?}");
}

#[tokio::test]
async fn test_range_is_forwarded() {
    let base = upstream().await;
    let range = HeaderValue::from_static("bytes=100-199");

    let upstream = proxy(32)
        .open(&format!("{}/media", base), Some(&range))
        .await
        .unwrap();
    assert_eq!(upstream.status, StatusCode::PARTIAL_CONTENT);

    let response = upstream.into_response("video/mp4", &Disposition::Inline, false, "range test");
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 100-199/{}", LEN).as_str()
    );
    assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], &common::payload(LEN)[100..200]);
}

/// Wraps an upstream body and records when the server drops it.
struct DropFlag<S> {
    inner: S,
    dropped: Arc<AtomicBool>,
}

impl<S: Stream + Unpin> Stream for DropFlag<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<S> Drop for DropFlag<S> {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Serves 16 KiB chunks forever.
fn endless(dropped: Arc<AtomicBool>) -> Body {
    let chunks = stream::unfold(0u64, |n| async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Some((Ok::<_, std::io::Error>(Bytes::from(vec![(n % 251) as u8; 16 * 1024])), n + 1))
    })
    .boxed();
    Body::from_stream(DropFlag {
        inner: chunks,
        dropped,
    })
}

#[tokio::test]
async fn test_client_drop_closes_upstream() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();
    let router = Router::new().route(
        "/endless",
        get(move || {
            let flag = flag.clone();
            async move { endless(flag) }
        }),
    );
    let base = common::spawn(router).await;

    let upstream = proxy(1024)
        .open(&format!("{}/endless", base), None)
        .await
        .unwrap();
    let mut stream = upstream.into_stream("early drop");
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1024);
    assert_eq!(stream.relayed(), 1024);
    assert!(!dropped.load(Ordering::SeqCst));

    drop(stream);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !dropped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("upstream kept sending after the relay was dropped");
}

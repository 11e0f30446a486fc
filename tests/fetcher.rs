mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{Router, extract::State, http::StatusCode, routing::get};
use ytrelay::{
    common::RelayError,
    configs::YouTubeConfig,
    sources::youtube::{
        fetcher::{PageFetcher, PageKind},
        url::VideoId,
    },
};

fn fetcher(base_url: &str, max_retries: u32) -> PageFetcher {
    PageFetcher::new(&YouTubeConfig {
        base_url: base_url.to_string(),
        max_retries,
        backoff_base_ms: 1,
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

/// Serves `status` for the first `failures` requests to /watch, then 200.
async fn upstream(status: StatusCode, failures: usize) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/watch",
            get(
                move |State(hits): State<Arc<AtomicUsize>>| async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        (status, "nope".to_string())
                    } else {
                        (StatusCode::OK, "<html>ok</html>".to_string())
                    }
                },
            ),
        )
        .with_state(hits.clone());
    (common::spawn(router).await, hits)
}

fn id() -> VideoId {
    VideoId::parse("dQw4w9WgXcQ").unwrap()
}

#[tokio::test]
async fn test_rate_limit_is_retried_up_to_bound() {
    let (base, hits) = upstream(StatusCode::TOO_MANY_REQUESTS, usize::MAX).await;

    let err = fetcher(&base, 2).fetch(&id(), PageKind::Watch).await.unwrap_err();
    match err {
        RelayError::RateLimited { attempts } => assert_eq!(attempts, 3),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_rate_limit_recovers() {
    let (base, hits) = upstream(StatusCode::TOO_MANY_REQUESTS, 2).await;

    let page = fetcher(&base, 3).fetch(&id(), PageKind::Watch).await.unwrap();
    assert_eq!(page.kind, PageKind::Watch);
    assert_eq!(page.body, "<html>ok</html>");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let (base, hits) = upstream(StatusCode::INTERNAL_SERVER_ERROR, usize::MAX).await;

    let err = fetcher(&base, 5).fetch(&id(), PageKind::Watch).await.unwrap_err();
    assert!(matches!(err, RelayError::FetchFailed { .. }), "{err:?}");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_host_fails_fast() {
    let (listener, base) = common::bind().await;
    drop(listener);

    let err = fetcher(&base, 3).fetch(&id(), PageKind::Embed).await.unwrap_err();
    assert!(matches!(err, RelayError::FetchFailed { .. }), "{err:?}");
}

#![allow(dead_code)]

use axum::Router;
use tokio::net::TcpListener;

/// Binds an ephemeral local port. The base URL is known before the router is
/// built, so fixtures can point back at themselves.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

pub fn serve(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

pub async fn spawn(router: Router) -> String {
    let (listener, base) = bind().await;
    serve(listener, router);
    base
}

/// Deterministic, non-repeating-looking payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

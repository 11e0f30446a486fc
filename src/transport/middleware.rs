use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{common::ErrorBody, server::AppState};

/// Paths reachable without the shared secret.
const PUBLIC_PATHS: &[&str] = &["/health"];

/// Enforces `server.password` when one is configured. Without it, every
/// request passes.
pub async fn check_auth(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let Some(password) = state.config.server.password.as_deref() else {
        return next.run(req).await;
    };
    if PUBLIC_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth) if auth == password => next.run(req).await,
        Some(_) => {
            warn!("Authorization failed: invalid password");
            unauthorized()
        }
        None => {
            warn!("Authorization failed: missing Authorization header");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    let status = StatusCode::UNAUTHORIZED;
    (status, axum::Json(ErrorBody::new(status, "Unauthorized"))).into_response()
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        "ytrelay-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

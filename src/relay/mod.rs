//! Relays an upstream media body to the client without holding it in memory.

pub mod headers;
pub mod stream;

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header::RANGE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::stream::BoxStream;

pub use headers::{Disposition, SIGNATURE_UNCERTAIN, relay_headers, sanitize_filename};
pub use stream::RelayStream;

use crate::{
    common::{AnyResult, HttpClient, RelayError, RelayResult},
    configs::RelayConfig,
};

pub type UpstreamBody = BoxStream<'static, reqwest::Result<Bytes>>;

pub struct StreamProxy {
    http: reqwest::Client,
    chunk_size: usize,
    response_timeout: Duration,
}

/// An upstream response whose status has been checked but whose body has
/// not been read yet.
pub struct Upstream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: UpstreamBody,
    chunk_size: usize,
}

impl StreamProxy {
    pub fn new(config: &RelayConfig) -> AnyResult<Self> {
        let http = HttpClient::relay(Duration::from_secs(config.connect_timeout_secs))?;
        Ok(Self {
            http,
            chunk_size: config.chunk_size.max(1),
            response_timeout: Duration::from_secs(config.response_timeout_secs),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sends the upstream request and waits for its headers. Anything other
    /// than 200 (or 206 when a range was asked for) fails here, before the
    /// client has seen a single byte.
    pub async fn open(&self, url: &str, range: Option<&HeaderValue>) -> RelayResult<Upstream> {
        let mut req = self.http.get(url);
        if let Some(range) = range {
            req = req.header(RANGE, range.clone());
        }

        let res = tokio::time::timeout(self.response_timeout, req.send())
            .await
            .map_err(|_| {
                RelayError::fetch_failed(
                    "upstream stream",
                    format!("no response within {:?}", self.response_timeout),
                )
            })??;

        let status = res.status();
        let accepted = status == StatusCode::OK
            || (range.is_some() && status == StatusCode::PARTIAL_CONTENT);
        if !accepted {
            tracing::warn!("upstream answered {} for {}", status, redact(url));
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        tracing::debug!(
            "upstream {} for {} (length {:?})",
            status,
            redact(url),
            res.content_length()
        );

        Ok(Upstream {
            status,
            headers: res.headers().clone(),
            body: Box::pin(res.bytes_stream()),
            chunk_size: self.chunk_size,
        })
    }
}

impl Upstream {
    pub fn into_stream(self, label: impl Into<String>) -> RelayStream<UpstreamBody> {
        RelayStream::new(self.body, self.chunk_size, label)
    }

    /// Builds the client response: upstream status, relay headers, and the
    /// re-chunked body.
    pub fn into_response(
        self,
        content_type: &str,
        disposition: &Disposition,
        signature_uncertain: bool,
        label: impl Into<String>,
    ) -> Response {
        let status = self.status;
        let headers = relay_headers(&self.headers, content_type, disposition, signature_uncertain);
        let body = Body::from_stream(self.into_stream(label));
        (status, headers, body).into_response()
    }
}

/// Media URLs carry signatures and client IPs; keep only host and path in logs.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://r1.googlevideo.com/videoplayback?ip=1.2.3.4&sig=x"),
            "https://r1.googlevideo.com/videoplayback"
        );
        assert_eq!(redact("http://h/p"), "http://h/p");
    }

    #[test]
    fn test_chunk_size_floor() {
        let proxy = StreamProxy::new(&RelayConfig {
            chunk_size: 0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(proxy.chunk_size(), 1);
    }
}

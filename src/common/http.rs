use std::time::Duration;

use reqwest::{
    Client, Error,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

pub struct HttpClient;

impl HttpClient {
    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers
    }

    /// Client for page fetches: the whole request, body included, must finish
    /// within `timeout`.
    pub fn pages(timeout: Duration) -> Result<Client, Error> {
        Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(Self::browser_headers())
            .cookie_store(true)
            .timeout(timeout)
            .build()
    }

    /// Client for relaying media. No total timeout: a long download is not a
    /// stalled one. Bodies are relayed as served, never decompressed.
    pub fn relay(connect_timeout: Duration) -> Result<Client, Error> {
        Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(connect_timeout)
            .no_gzip()
            .no_deflate()
            .build()
    }
}

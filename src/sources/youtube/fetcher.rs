use std::{fmt, str::FromStr, time::Duration};

use reqwest::{RequestBuilder, StatusCode, header::COOKIE};
use serde_json::{Value, json};

use crate::{
    common::{AnyResult, DEFAULT_USER_AGENT, HttpClient, RelayError, RelayResult},
    configs::YouTubeConfig,
    sources::youtube::url::VideoId,
};

const CLIENT_NAME: &str = "WEB_EMBEDDED_PLAYER";
const CLIENT_ID: &str = "56";
const CLIENT_VERSION: &str = "1.20250219.01.00";

/// Skips the EU consent interstitial.
const CONSENT_COOKIE: &str = "CONSENT=YES+cb; SOCS=CAI";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Watch,
    Embed,
    InternalApi,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Watch => "watch",
            PageKind::Embed => "embed",
            PageKind::InternalApi => "api",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "watch" => Ok(PageKind::Watch),
            "embed" => Ok(PageKind::Embed),
            "api" | "player" | "innertube" => Ok(PageKind::InternalApi),
            other => Err(format!("unknown page kind '{}'", other)),
        }
    }
}

/// Raw body of one fetched page.
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub kind: PageKind,
    pub body: String,
}

pub struct PageFetcher {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff_base: Duration,
}

impl PageFetcher {
    pub fn new(config: &YouTubeConfig) -> AnyResult<Self> {
        let http = HttpClient::pages(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn player_context(&self) -> Value {
        json!({
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "userAgent": DEFAULT_USER_AGENT,
                "platform": "DESKTOP",
                "hl": "en",
                "gl": "US"
            },
            "user": { "lockedSafetyMode": false },
            "thirdParty": { "embedUrl": self.base_url }
        })
    }

    fn request(&self, id: &VideoId, kind: PageKind) -> RequestBuilder {
        let req = match kind {
            PageKind::Watch => self.http.get(format!(
                "{}/watch?v={}&bpctr=9999999999&has_verified=1",
                self.base_url, id
            )),
            PageKind::Embed => self.http.get(format!("{}/embed/{}", self.base_url, id)),
            PageKind::InternalApi => self
                .http
                .post(format!(
                    "{}/youtubei/v1/player?prettyPrint=false",
                    self.base_url
                ))
                .header("X-YouTube-Client-Name", CLIENT_ID)
                .header("X-YouTube-Client-Version", CLIENT_VERSION)
                .header("Origin", self.base_url.as_str())
                .json(&json!({
                    "context": self.player_context(),
                    "videoId": id.as_str(),
                    "contentCheckOk": true,
                    "racyCheckOk": true
                })),
        };
        req.header(COOKIE, CONSENT_COOKIE)
    }

    pub async fn fetch(&self, id: &VideoId, kind: PageKind) -> RelayResult<PageDocument> {
        let what = format!("{} page for {}", kind, id);
        let body = self.send_with_backoff(&what, || self.request(id, kind)).await?;
        tracing::debug!("fetched {} ({} bytes)", what, body.len());
        Ok(PageDocument { kind, body })
    }

    pub async fn fetch_search(&self, query: &str) -> RelayResult<String> {
        let url = format!(
            "{}/results?search_query={}&sp=EgIQAQ%3D%3D",
            self.base_url,
            urlencoding::encode(query)
        );
        let what = format!("search results for '{}'", query);
        self.send_with_backoff(&what, || self.http.get(&url).header(COOKIE, CONSENT_COOKIE))
            .await
    }

    /// Retries only on HTTP 429, sleeping `backoff_base * 2^attempt` between
    /// tries. Everything else fails on the first attempt.
    async fn send_with_backoff<F>(&self, what: &str, build: F) -> RelayResult<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            let res = build()
                .send()
                .await
                .map_err(|e| RelayError::fetch_failed(what, e))?;
            let status = res.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(RelayError::RateLimited {
                        attempts: attempt + 1,
                    });
                }
                let delay = self.backoff_base.saturating_mul(1u32 << attempt.min(16));
                tracing::warn!(
                    "{}: rate limited (attempt {}/{}), retrying in {:?}",
                    what,
                    attempt + 1,
                    self.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                return Err(RelayError::fetch_failed(what, format!("HTTP {}", status)));
            }

            return res
                .text()
                .await
                .map_err(|e| RelayError::fetch_failed(what, e));
        }
    }
}

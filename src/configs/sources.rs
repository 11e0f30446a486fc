use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YouTubeConfig {
    /// Provider origin for watch/embed/player/search requests.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Image CDN origin for thumbnails.
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Per-request timeout for page fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after an HTTP 429.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Pages tried in order: "watch", "embed", "api".
    #[serde(default = "default_page_order")]
    pub page_order: Vec<String>,
    /// Guessed signature transform, e.g. ["reverse", "splice:2", "swap:17"].
    #[serde(default = "default_signature_ops")]
    pub signature_ops: Vec<String>,
}

fn default_base_url() -> String {
    "https://www.youtube.com".to_string()
}

fn default_image_base_url() -> String {
    "https://i.ytimg.com".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_page_order() -> Vec<String> {
    vec!["watch".into(), "embed".into(), "api".into()]
}

fn default_signature_ops() -> Vec<String> {
    vec!["reverse".into(), "splice:2".into(), "swap:17".into()]
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            page_order: default_page_order(),
            signature_ops: default_signature_ops(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayConfig {
    /// Size of each chunk written to the client.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How long to wait for upstream response headers.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_response_timeout_secs() -> u64 {
    30
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
            response_timeout_secs: default_response_timeout_secs(),
        }
    }
}

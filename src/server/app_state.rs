use std::time::Instant;

use crate::{
    common::AnyResult, configs::Config, relay::StreamProxy, sources::YouTubeSource,
};

/// Top-level application state. Read-only after startup; nothing here is
/// shared between requests except clients and configuration.
pub struct AppState {
    pub config: Config,
    pub youtube: YouTubeSource,
    pub proxy: StreamProxy,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> AnyResult<Self> {
        let youtube = YouTubeSource::new(&config.youtube)?;
        let proxy = StreamProxy::new(&config.relay)?;
        Ok(Self {
            config,
            youtube,
            proxy,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

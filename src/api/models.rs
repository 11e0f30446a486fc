use serde::Deserialize;

/// Query parameters for the endpoints that take a video URL.
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    /// Video URL or bare 11-character id.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: String,
    /// Label like "720p" or a bare height.
    pub quality: Option<String>,
    /// Exact format, wins over `quality`.
    pub itag: Option<u32>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub url: String,
    pub itag: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub limit: Option<usize>,
}

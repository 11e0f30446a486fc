pub mod cipher;
pub mod extractor;
pub mod fetcher;
pub mod formats;
pub mod player;
pub mod search;
pub mod url;

use cipher::SignatureDecoder;
use extractor::extract_player_config;
use fetcher::{PageFetcher, PageKind};
use formats::{FormatDescriptor, ResolvedStream, StreamSource, resolve_formats};
use player::PlayerConfig;
use search::{SearchResponse, parse_results_page};
use self::url::VideoId;

use crate::{
    common::{AnyResult, RelayError, RelayResult},
    configs::YouTubeConfig,
};

/// Thumbnail sizes served by the image CDN, largest first.
pub const THUMBNAIL_QUALITIES: &[&str] = &["maxres", "sd", "hq", "mq", "default"];

/// Everything known about one video after a successful page load.
#[derive(Debug, Clone)]
pub struct VideoData {
    pub id: VideoId,
    pub source: PageKind,
    pub config: PlayerConfig,
    pub formats: Vec<FormatDescriptor>,
}

pub struct YouTubeSource {
    fetcher: PageFetcher,
    decoder: SignatureDecoder,
    page_order: Vec<PageKind>,
    image_base_url: String,
}

impl YouTubeSource {
    pub fn new(config: &YouTubeConfig) -> AnyResult<Self> {
        let mut page_order: Vec<PageKind> = Vec::new();
        for name in &config.page_order {
            match name.parse::<PageKind>() {
                Ok(kind) if !page_order.contains(&kind) => page_order.push(kind),
                Ok(_) => {}
                Err(e) => tracing::warn!("ignoring page_order entry: {}", e),
            }
        }
        if page_order.is_empty() {
            page_order = vec![PageKind::Watch, PageKind::Embed, PageKind::InternalApi];
        }

        let decoder = SignatureDecoder::from_config(&config.signature_ops);
        tracing::debug!(
            "youtube source: pages {:?}, signature ops {:?}",
            page_order,
            decoder.ops()
        );

        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            decoder,
            page_order,
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn page_order(&self) -> &[PageKind] {
        &self.page_order
    }

    /// Tries each configured page kind in turn. The first page that yields a
    /// playable config with at least one format wins; a playable config with
    /// no usable formats is kept as a fallback in case no later page does
    /// better. A rate limit stops the walk immediately.
    pub async fn load_video(&self, input: &str) -> RelayResult<VideoData> {
        let id = VideoId::parse(input)?;
        let mut partial: Option<VideoData> = None;
        let mut unavailable: Option<String> = None;
        let mut last_err: Option<RelayError> = None;

        for &kind in &self.page_order {
            let page = match self.fetcher.fetch(&id, kind).await {
                Ok(page) => page,
                Err(e @ RelayError::RateLimited { .. }) => return Err(e),
                Err(e) => {
                    tracing::debug!("{} page for {} failed: {}", kind, id, e);
                    last_err = Some(e);
                    continue;
                }
            };

            let config = match extract_player_config(&page) {
                Ok(config) => config,
                Err(e) => {
                    tracing::debug!("{}", e);
                    last_err = Some(e);
                    continue;
                }
            };

            if !config.is_playable() {
                let reason = config.unplayable_reason();
                tracing::debug!("{} page for {} not playable: {}", kind, id, reason);
                unavailable = Some(reason);
                continue;
            }

            let formats = resolve_formats(&config);
            tracing::debug!(
                "{} page for {}: {} of {} formats usable",
                kind,
                id,
                formats.len(),
                config.raw_format_count()
            );

            let data = VideoData {
                id: id.clone(),
                source: kind,
                config,
                formats,
            };
            if !data.formats.is_empty() {
                return Ok(data);
            }
            if partial.is_none() {
                partial = Some(data);
            }
        }

        if let Some(data) = partial {
            return Ok(data);
        }
        if let Some(reason) = unavailable {
            return Err(RelayError::VideoUnavailable(reason));
        }
        Err(last_err.unwrap_or_else(|| RelayError::ConfigNotFound("any".to_string())))
    }

    /// Produces the URL to relay. Ciphered formats go through the guessed
    /// transform and come back flagged as uncertain.
    pub fn resolve_stream(&self, format: &FormatDescriptor) -> RelayResult<ResolvedStream> {
        let (url, signature_uncertain) = match &format.source {
            StreamSource::Direct(url) => (url.clone(), false),
            StreamSource::Cipher(cipher) => {
                let url = self.decoder.decode_url(cipher).ok_or_else(|| {
                    RelayError::FormatNotAvailable(format!(
                        "itag {} has an incomplete signature cipher",
                        format.itag
                    ))
                })?;
                (url, true)
            }
        };

        Ok(ResolvedStream {
            url,
            content_type: format.content_type().to_string(),
            content_length: format.content_length,
            signature_uncertain,
        })
    }

    pub async fn search(&self, query: &str, limit: usize) -> RelayResult<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RelayError::InvalidInput("empty search query".to_string()));
        }

        let body = self.fetcher.fetch_search(query).await?;
        let results = parse_results_page(&body);
        tracing::debug!("search '{}' returned {} results", query, results.len());
        Ok(SearchResponse::new(query, results, limit))
    }

    /// `<image_base>/vi/<id>/<quality>default.jpg`, or `default.jpg` for the
    /// smallest size.
    pub fn thumbnail_url(&self, id: &VideoId, quality: &str) -> RelayResult<String> {
        let quality = quality.trim().to_ascii_lowercase();
        if !THUMBNAIL_QUALITIES.contains(&quality.as_str()) {
            return Err(RelayError::InvalidInput(format!(
                "unknown thumbnail quality '{}'",
                quality
            )));
        }
        let file = if quality == "default" {
            "default.jpg".to_string()
        } else {
            format!("{}default.jpg", quality)
        };
        Ok(format!("{}/vi/{}/{}", self.image_base_url, id, file))
    }

    /// The fixed CDN set, one URL per entry of [`THUMBNAIL_QUALITIES`].
    pub fn default_thumbnails(&self, id: &VideoId) -> Vec<(&'static str, String)> {
        THUMBNAIL_QUALITIES
            .iter()
            .filter_map(|q| self.thumbnail_url(id, q).ok().map(|url| (*q, url)))
            .collect()
    }
}

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::sources::youtube::{
    VideoData,
    formats::{FormatDescriptor, StreamKind, best_audio, best_video},
    player::Thumbnail,
};

/// How many entries of each list `/info` returns.
pub const INFO_FORMAT_LIMIT: usize = 10;

/// A format as shown to API clients: every descriptor field plus whether the
/// URL has to go through signature decoding.
#[derive(Debug, Serialize)]
pub struct FormatView<'a> {
    #[serde(flatten)]
    pub format: &'a FormatDescriptor,
    pub ciphered: bool,
    pub filesize_mb: Option<f64>,
}

impl<'a> From<&'a FormatDescriptor> for FormatView<'a> {
    fn from(format: &'a FormatDescriptor) -> Self {
        Self {
            format,
            ciphered: format.is_ciphered(),
            filesize_mb: format
                .content_length
                .map(|len| (len as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoInfo<'a> {
    pub video_id: &'a str,
    pub title: Option<&'a str>,
    pub channel: Option<&'a str>,
    pub channel_id: Option<&'a str>,
    /// Seconds.
    pub duration: Option<u64>,
    pub views: Option<u64>,
    pub description: Option<&'a str>,
    pub keywords: &'a [String],
    pub is_live: bool,
    pub thumbnail: Option<&'a str>,
    pub thumbnails: &'a [Thumbnail],
    pub formats_count: usize,
    pub formats: Vec<FormatView<'a>>,
    pub audio_formats: Vec<FormatView<'a>>,
    pub best_video: Option<FormatView<'a>>,
    pub best_audio: Option<FormatView<'a>>,
    /// Which page the data came from.
    pub source: &'static str,
}

impl<'a> VideoInfo<'a> {
    pub fn new(data: &'a VideoData) -> Self {
        let details = data.config.video_details.as_ref();
        let thumbnails = details.map(|d| d.thumbnails()).unwrap_or_default();

        let (audio, video): (Vec<&FormatDescriptor>, Vec<&FormatDescriptor>) = data
            .formats
            .iter()
            .partition(|f| f.kind == StreamKind::AudioOnly);

        Self {
            video_id: data.id.as_str(),
            title: details.and_then(|d| d.title.as_deref()),
            channel: details.and_then(|d| d.author.as_deref()),
            channel_id: details.and_then(|d| d.channel_id.as_deref()),
            duration: details.and_then(|d| d.length_seconds),
            views: details.and_then(|d| d.view_count),
            description: details.and_then(|d| d.short_description.as_deref()),
            keywords: details.map(|d| d.keywords.as_slice()).unwrap_or_default(),
            is_live: details.and_then(|d| d.is_live_content).unwrap_or(false),
            thumbnail: largest_thumbnail(thumbnails).map(|t| t.url.as_str()),
            thumbnails,
            formats_count: data.formats.len(),
            formats: video
                .into_iter()
                .take(INFO_FORMAT_LIMIT)
                .map(FormatView::from)
                .collect(),
            audio_formats: audio
                .into_iter()
                .take(INFO_FORMAT_LIMIT)
                .map(FormatView::from)
                .collect(),
            best_video: best_video(&data.formats).map(FormatView::from),
            best_audio: best_audio(&data.formats).map(FormatView::from),
            source: data.source.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormatsListing<'a> {
    pub video_id: &'a str,
    pub title: Option<&'a str>,
    pub total_formats: usize,
    pub formats_by_quality: BTreeMap<&'a str, Vec<FormatView<'a>>>,
}

impl<'a> FormatsListing<'a> {
    pub fn new(data: &'a VideoData) -> Self {
        let mut formats_by_quality: BTreeMap<&str, Vec<FormatView>> = BTreeMap::new();
        for format in &data.formats {
            formats_by_quality
                .entry(format.quality.as_str())
                .or_default()
                .push(FormatView::from(format));
        }

        Self {
            video_id: data.id.as_str(),
            title: data.config.title(),
            total_formats: data.formats.len(),
            formats_by_quality,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThumbnailListing<'a> {
    pub video_id: &'a str,
    pub title: Option<&'a str>,
    /// Keyed by CDN size name ("hq", "maxres", ...) or by "WIDTHxHEIGHT" for
    /// thumbnails the page itself declared.
    pub thumbnails: HashMap<String, String>,
    pub best_thumbnail: String,
}

impl<'a> ThumbnailListing<'a> {
    /// `defaults` is the fixed CDN set, largest first.
    pub fn new(data: &'a VideoData, defaults: Vec<(&'static str, String)>) -> Self {
        let declared = data
            .config
            .video_details
            .as_ref()
            .map(|d| d.thumbnails())
            .unwrap_or_default();

        let fallback = defaults.first().map(|(_, url)| url.clone()).unwrap_or_default();
        let best_thumbnail = largest_thumbnail(declared)
            .map(|t| t.url.clone())
            .unwrap_or(fallback);

        let mut thumbnails: HashMap<String, String> = defaults
            .into_iter()
            .map(|(name, url)| (name.to_string(), url))
            .collect();
        for thumb in declared {
            let key = format!(
                "{}x{}",
                thumb.width.unwrap_or(0),
                thumb.height.unwrap_or(0)
            );
            thumbnails.insert(key, thumb.url.clone());
        }

        Self {
            video_id: data.id.as_str(),
            title: data.config.title(),
            thumbnails,
            best_thumbnail,
        }
    }
}

fn largest_thumbnail(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails
        .iter()
        .max_by_key(|t| u64::from(t.width.unwrap_or(0)) * u64::from(t.height.unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::youtube::{
        fetcher::PageKind, formats::resolve_formats, player::PlayerConfig, url::VideoId,
    };
    use serde_json::json;

    fn video() -> VideoData {
        let config = PlayerConfig::from_value(json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": {
                "videoId": "dQw4w9WgXcQ",
                "title": "Never Gonna Give You Up",
                "author": "Rick Astley",
                "lengthSeconds": "212",
                "viewCount": "1600000000",
                "thumbnail": { "thumbnails": [
                    { "url": "https://i.ytimg.com/small.jpg", "width": 120, "height": 90 },
                    { "url": "https://i.ytimg.com/big.jpg", "width": 1280, "height": 720 }
                ] }
            },
            "streamingData": {
                "formats": [
                    { "itag": 18, "mimeType": "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"", "qualityLabel": "360p", "height": 360, "bitrate": 500000, "contentLength": "10485760", "url": "https://v/18" }
                ],
                "adaptiveFormats": [
                    { "itag": 137, "mimeType": "video/mp4; codecs=\"avc1.640028\"", "qualityLabel": "1080p", "height": 1080, "bitrate": 4000000, "signatureCipher": "s=abc&url=https%3A%2F%2Fv%2F137" },
                    { "itag": 140, "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"", "bitrate": 130000, "url": "https://v/140" }
                ]
            }
        }))
        .unwrap();

        VideoData {
            id: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            source: PageKind::Watch,
            formats: resolve_formats(&config),
            config,
        }
    }

    #[test]
    fn test_video_info() {
        let data = video();
        let info = serde_json::to_value(VideoInfo::new(&data)).unwrap();

        assert_eq!(info["video_id"], "dQw4w9WgXcQ");
        assert_eq!(info["channel"], "Rick Astley");
        assert_eq!(info["duration"], 212);
        assert_eq!(info["views"], 1_600_000_000u64);
        assert_eq!(info["is_live"], false);
        assert_eq!(info["thumbnail"], "https://i.ytimg.com/big.jpg");
        assert_eq!(info["formats_count"], 3);
        assert_eq!(info["formats"].as_array().unwrap().len(), 2);
        assert_eq!(info["audio_formats"][0]["itag"], 140);
        assert_eq!(info["best_video"]["itag"], 137);
        assert_eq!(info["best_video"]["ciphered"], true);
        assert_eq!(info["best_audio"]["kind"], "audio_only");
        assert_eq!(info["formats"][0]["filesize_mb"], 10.0);
        assert_eq!(info["source"], "watch");
    }

    #[test]
    fn test_formats_listing() {
        let data = video();
        let listing = serde_json::to_value(FormatsListing::new(&data)).unwrap();

        assert_eq!(listing["total_formats"], 3);
        assert_eq!(listing["formats_by_quality"]["360p"][0]["itag"], 18);
        assert_eq!(listing["formats_by_quality"]["1080p"][0]["itag"], 137);
        assert_eq!(listing["formats_by_quality"]["130kbps"][0]["itag"], 140);
    }

    #[test]
    fn test_thumbnail_listing() {
        let data = video();
        let defaults = vec![
            ("maxres", "https://cdn/vi/x/maxresdefault.jpg".to_string()),
            ("hq", "https://cdn/vi/x/hqdefault.jpg".to_string()),
        ];
        let listing = ThumbnailListing::new(&data, defaults);

        assert_eq!(listing.best_thumbnail, "https://i.ytimg.com/big.jpg");
        assert_eq!(listing.thumbnails.len(), 4);
        assert_eq!(listing.thumbnails["120x90"], "https://i.ytimg.com/small.jpg");
        assert_eq!(listing.thumbnails["hq"], "https://cdn/vi/x/hqdefault.jpg");
    }

    #[test]
    fn test_thumbnail_listing_without_page_thumbnails() {
        let config = PlayerConfig::from_value(json!({ "videoDetails": { "videoId": "dQw4w9WgXcQ" } })).unwrap();
        let data = VideoData {
            id: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            source: PageKind::Embed,
            formats: Vec::new(),
            config,
        };
        let listing = ThumbnailListing::new(
            &data,
            vec![("maxres", "https://cdn/vi/x/maxresdefault.jpg".to_string())],
        );
        assert_eq!(listing.best_thumbnail, "https://cdn/vi/x/maxresdefault.jpg");
    }
}

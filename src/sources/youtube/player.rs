use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Where the interesting sub-objects may sit, depending on which page the
/// document came from. Anything elsewhere is treated as absent.
const STREAMING_DATA_PATHS: &[&[&str]] = &[
    &["streamingData"],
    &["playerResponse", "streamingData"],
    &["player_response", "streamingData"],
    &["response", "playerResponse", "streamingData"],
];
const VIDEO_DETAILS_PATHS: &[&[&str]] = &[
    &["videoDetails"],
    &["playerResponse", "videoDetails"],
    &["player_response", "videoDetails"],
    &["response", "playerResponse", "videoDetails"],
];
const PLAYABILITY_PATHS: &[&[&str]] = &[
    &["playabilityStatus"],
    &["playerResponse", "playabilityStatus"],
    &["player_response", "playabilityStatus"],
    &["response", "playerResponse", "playabilityStatus"],
];

fn walk<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

fn locate<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|p| walk(value, p))
}

/// Typed view of a player response. Every part is optional because the
/// provider guarantees none of them.
#[derive(Debug, Clone, Default)]
pub struct PlayerConfig {
    pub playability: Option<Playability>,
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
}

impl PlayerConfig {
    /// Returns `None` when the document carries neither video details nor
    /// streaming data, i.e. it is not a player response at all.
    pub fn from_value(value: Value) -> Option<Self> {
        let video_details = locate(&value, VIDEO_DETAILS_PATHS).and_then(|v| {
            serde_json::from_value::<VideoDetails>(v.clone())
                .map_err(|e| tracing::debug!("ignoring malformed videoDetails: {}", e))
                .ok()
        });
        let streaming_data = locate(&value, STREAMING_DATA_PATHS).and_then(StreamingData::from_value);

        if video_details.is_none() && streaming_data.is_none() {
            return None;
        }

        let playability = locate(&value, PLAYABILITY_PATHS)
            .and_then(|v| serde_json::from_value::<Playability>(v.clone()).ok());

        Some(Self {
            playability,
            video_details,
            streaming_data,
        })
    }

    pub fn playability_status(&self) -> &str {
        self.playability
            .as_ref()
            .and_then(|p| p.status.as_deref())
            .unwrap_or("UNKNOWN")
    }

    /// A missing status counts as playable; only an explicit non-OK does not.
    pub fn is_playable(&self) -> bool {
        matches!(self.playability_status(), "OK" | "UNKNOWN")
    }

    pub fn unplayable_reason(&self) -> String {
        self.playability
            .as_ref()
            .and_then(|p| p.reason.clone())
            .unwrap_or_else(|| format!("playability status {}", self.playability_status()))
    }

    pub fn title(&self) -> Option<&str> {
        self.video_details.as_ref().and_then(|d| d.title.as_deref())
    }

    pub fn raw_format_count(&self) -> usize {
        self.streaming_data
            .as_ref()
            .map(|s| s.formats.len() + s.adaptive_formats.len())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Playability {
    pub status: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoDetails {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub channel_id: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub length_seconds: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub view_count: Option<u64>,
    pub short_description: Option<String>,
    pub keywords: Vec<String>,
    pub is_live_content: Option<bool>,
    pub thumbnail: Option<ThumbnailList>,
}

impl VideoDetails {
    pub fn thumbnails(&self) -> &[Thumbnail] {
        self.thumbnail
            .as_ref()
            .map(|t| t.thumbnails.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThumbnailList {
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Format lists stay as raw JSON here so that one malformed entry cannot
/// spoil the rest; see `formats::resolve_formats`.
#[derive(Debug, Clone, Default)]
pub struct StreamingData {
    pub formats: Vec<Value>,
    pub adaptive_formats: Vec<Value>,
    pub expires_in_seconds: Option<u64>,
    pub hls_manifest_url: Option<String>,
    pub dash_manifest_url: Option<String>,
}

impl StreamingData {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;

        let list = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            formats: list("formats"),
            adaptive_formats: list("adaptiveFormats"),
            expires_in_seconds: value.get("expiresInSeconds").and_then(lenient_u64_value),
            hls_manifest_url: text("hlsManifestUrl"),
            dash_manifest_url: text("dashManifestUrl"),
        })
    }
}

/// The provider sends most integers as strings ("212"), some as numbers.
pub fn lenient_u64_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_u64_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_document() {
        let config = PlayerConfig::from_value(json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": {
                "videoId": "dQw4w9WgXcQ",
                "title": "Never Gonna Give You Up",
                "author": "Rick Astley",
                "lengthSeconds": "212",
                "viewCount": 1600000000u64,
                "keywords": ["rick", "astley"],
                "thumbnail": { "thumbnails": [
                    { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg", "width": 120, "height": 90 }
                ] }
            },
            "streamingData": {
                "expiresInSeconds": "21540",
                "formats": [ {}, {} ],
                "adaptiveFormats": [ {} ]
            }
        }))
        .unwrap();

        assert!(config.is_playable());
        assert_eq!(config.title(), Some("Never Gonna Give You Up"));
        let details = config.video_details.as_ref().unwrap();
        assert_eq!(details.length_seconds, Some(212));
        assert_eq!(details.view_count, Some(1_600_000_000));
        assert_eq!(details.keywords, vec!["rick", "astley"]);
        assert_eq!(details.thumbnails().len(), 1);
        assert_eq!(config.raw_format_count(), 3);
        assert_eq!(
            config.streaming_data.as_ref().unwrap().expires_in_seconds,
            Some(21540)
        );
    }

    #[test]
    fn test_nested_player_response() {
        let config = PlayerConfig::from_value(json!({
            "response": { "playerResponse": {
                "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": "Sign in to confirm your age" },
                "videoDetails": { "videoId": "abcdefghijk" }
            } }
        }))
        .unwrap();

        assert!(!config.is_playable());
        assert_eq!(config.unplayable_reason(), "Sign in to confirm your age");
        assert!(config.streaming_data.is_none());
        assert_eq!(config.raw_format_count(), 0);
    }

    #[test]
    fn test_non_player_document() {
        assert!(PlayerConfig::from_value(json!({ "responseContext": {} })).is_none());
        assert!(PlayerConfig::from_value(json!({ "streamingData": "nope" })).is_none());
    }

    #[test]
    fn test_malformed_details_degrade_to_none() {
        let config = PlayerConfig::from_value(json!({
            "videoDetails": { "keywords": "not-a-list" },
            "streamingData": { "formats": [] }
        }))
        .unwrap();
        assert!(config.video_details.is_none());
        assert!(config.streaming_data.is_some());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    common::{RelayError, RelayResult},
    sources::youtube::player::{PlayerConfig, lenient_u64},
};

/// Codec name fragments that mean a `video/*` stream also carries audio.
const AUDIO_CODECS: &[&str] = &["mp4a", "opus", "vorbis", "ac-3", "ec-3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Combined,
    VideoOnly,
    AudioOnly,
}

/// Exactly one way to reach the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    Direct(String),
    Cipher(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FormatDescriptor {
    pub itag: u32,
    pub mime_type: String,
    pub container: String,
    pub codecs: Option<String>,
    pub kind: StreamKind,
    pub has_video: bool,
    pub has_audio: bool,
    pub quality: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub bitrate: Option<u64>,
    pub content_length: Option<u64>,
    pub audio_quality: Option<String>,
    #[serde(skip)]
    pub source: StreamSource,
}

/// What the relay needs; built per request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    /// Set when the URL came out of the guessed signature transform.
    pub signature_uncertain: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormat {
    itag: u32,
    mime_type: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    signature_cipher: Option<String>,
    #[serde(default)]
    cipher: Option<String>,
    #[serde(default)]
    quality_label: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    fps: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u64")]
    bitrate: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    content_length: Option<u64>,
    #[serde(default)]
    audio_quality: Option<String>,
}

impl FormatDescriptor {
    fn from_raw(raw: RawFormat) -> Option<Self> {
        let source = match (raw.url, raw.signature_cipher.or(raw.cipher)) {
            (Some(url), _) if !url.is_empty() => StreamSource::Direct(url),
            (_, Some(cipher)) if !cipher.is_empty() => StreamSource::Cipher(cipher),
            _ => return None,
        };

        let (kind, has_video, has_audio) = classify(&raw.mime_type)?;
        let quality = quality_label(raw.quality_label.as_deref(), raw.height, raw.bitrate);

        Some(Self {
            itag: raw.itag,
            container: container(&raw.mime_type),
            codecs: codecs(&raw.mime_type).map(str::to_string),
            mime_type: raw.mime_type,
            kind,
            has_video,
            has_audio,
            quality,
            width: raw.width,
            height: raw.height,
            fps: raw.fps,
            bitrate: raw.bitrate,
            content_length: raw.content_length,
            audio_quality: raw.audio_quality,
            source,
        })
    }

    /// `video/mp4; codecs="..."` → `video/mp4`.
    pub fn content_type(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or(&self.mime_type)
            .trim()
    }

    pub fn extension(&self) -> &str {
        match (self.kind, self.container.as_str()) {
            (StreamKind::AudioOnly, "mp4") => "m4a",
            (_, "mp4") => "mp4",
            (_, "webm") => "webm",
            (_, "3gpp") => "3gp",
            _ => "bin",
        }
    }

    pub fn direct_url(&self) -> Option<&str> {
        match &self.source {
            StreamSource::Direct(url) => Some(url),
            StreamSource::Cipher(_) => None,
        }
    }

    pub fn is_ciphered(&self) -> bool {
        matches!(self.source, StreamSource::Cipher(_))
    }
}

/// Explicit label, then pixel height, then bitrate.
pub fn quality_label(label: Option<&str>, height: Option<u32>, bitrate: Option<u64>) -> String {
    if let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) {
        return label.to_string();
    }
    if let Some(h) = height.filter(|h| *h > 0) {
        return format!("{}p", h);
    }
    if let Some(b) = bitrate.filter(|b| *b > 0) {
        return format!("{}kbps", b / 1000);
    }
    "unknown".to_string()
}

fn codecs(mime: &str) -> Option<&str> {
    let (_, rest) = mime.split_once("codecs=")?;
    Some(rest.trim().trim_matches('"'))
}

fn container(mime: &str) -> String {
    mime.split(';')
        .next()
        .and_then(|base| base.split_once('/'))
        .map(|(_, sub)| sub.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Audio-only, video-only or combined, from the declared MIME type alone.
/// A `video/*` type without a codecs list is assumed to be muxed.
pub fn classify(mime: &str) -> Option<(StreamKind, bool, bool)> {
    let lower = mime.trim().to_ascii_lowercase();
    if lower.starts_with("audio/") {
        return Some((StreamKind::AudioOnly, false, true));
    }
    if !lower.starts_with("video/") {
        return None;
    }

    match codecs(&lower) {
        Some(c) if !AUDIO_CODECS.iter().any(|a| c.contains(a)) => {
            Some((StreamKind::VideoOnly, true, false))
        }
        _ => Some((StreamKind::Combined, true, true)),
    }
}

/// Walks `formats` then `adaptiveFormats`. Entries that do not deserialize
/// or cannot produce a URL are skipped, never fatal.
pub fn resolve_formats(config: &PlayerConfig) -> Vec<FormatDescriptor> {
    let Some(data) = &config.streaming_data else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(data.formats.len() + data.adaptive_formats.len());
    let mut skipped = 0usize;

    for entry in data.formats.iter().chain(data.adaptive_formats.iter()) {
        match normalize(entry) {
            Some(descriptor) => out.push(descriptor),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("skipped {} unusable format entries", skipped);
    }
    out
}

fn normalize(entry: &Value) -> Option<FormatDescriptor> {
    let raw = serde_json::from_value::<RawFormat>(entry.clone())
        .map_err(|e| tracing::trace!("malformed format entry: {}", e))
        .ok()?;
    FormatDescriptor::from_raw(raw)
}

pub fn find_itag(formats: &[FormatDescriptor], itag: u32) -> Option<&FormatDescriptor> {
    formats.iter().find(|f| f.itag == itag)
}

/// Accepts "720p", "720" or a full label like "1080p60". Muxed streams win
/// over video-only ones of the same quality.
pub fn find_quality<'a>(formats: &'a [FormatDescriptor], quality: &str) -> Option<&'a FormatDescriptor> {
    let wanted = quality.trim().to_ascii_lowercase();
    let wanted_height = wanted.trim_end_matches('p').parse::<u32>().ok();

    formats
        .iter()
        .filter(|f| f.has_video)
        .filter(|f| {
            f.quality.eq_ignore_ascii_case(&wanted)
                || (wanted_height.is_some() && f.height == wanted_height)
        })
        .max_by_key(|f| (f.kind == StreamKind::Combined, f.bitrate.unwrap_or(0)))
}

pub fn best_combined(formats: &[FormatDescriptor]) -> Option<&FormatDescriptor> {
    formats
        .iter()
        .filter(|f| f.kind == StreamKind::Combined)
        .max_by_key(|f| (f.height.unwrap_or(0), f.bitrate.unwrap_or(0)))
}

pub fn best_video(formats: &[FormatDescriptor]) -> Option<&FormatDescriptor> {
    formats
        .iter()
        .filter(|f| f.has_video)
        .max_by_key(|f| (f.height.unwrap_or(0), f.bitrate.unwrap_or(0)))
}

pub fn best_audio(formats: &[FormatDescriptor]) -> Option<&FormatDescriptor> {
    formats
        .iter()
        .filter(|f| f.kind == StreamKind::AudioOnly)
        .max_by_key(|f| f.bitrate.unwrap_or(0))
}

/// Picks the format for a download: an explicit itag wins, then a quality
/// label, then the best muxed stream, then the best video-only one. An
/// explicit itag or quality that is absent is an error, never a substitute.
pub fn select<'a>(
    formats: &'a [FormatDescriptor],
    itag: Option<u32>,
    quality: Option<&str>,
) -> RelayResult<&'a FormatDescriptor> {
    if let Some(itag) = itag {
        return find_itag(formats, itag)
            .ok_or_else(|| RelayError::FormatNotAvailable(format!("itag {}", itag)));
    }
    if let Some(quality) = quality.map(str::trim).filter(|q| !q.is_empty()) {
        return find_quality(formats, quality)
            .ok_or_else(|| RelayError::FormatNotAvailable(format!("quality {}", quality)));
    }
    best_combined(formats)
        .or_else(|| best_video(formats))
        .ok_or_else(|| RelayError::FormatNotAvailable("no video formats".to_string()))
}

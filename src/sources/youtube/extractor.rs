//! Locates the JSON documents YouTube inlines into its HTML.
//!
//! The marker names and surrounding script shapes have changed many times, so
//! extraction is an ordered list of small strategies. Each one is a pure
//! function from page text to a parsed JSON value and can be tested alone.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::{
    common::{RelayError, RelayResult},
    sources::youtube::{fetcher::PageDocument, player::PlayerConfig},
};

pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&str) -> Option<Value>,
}

pub const PLAYER_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "ytInitialPlayerResponse",
        run: initial_player_response,
    },
    Strategy {
        name: "ytplayer.config",
        run: ytplayer_config,
    },
    Strategy {
        name: "playerResponse",
        run: embedded_player_response,
    },
    Strategy {
        name: "json-document",
        run: json_document,
    },
];

pub const INITIAL_DATA_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "ytInitialData",
        run: initial_data,
    },
    Strategy {
        name: "json-document",
        run: json_document,
    },
];

static PLAYER_RESPONSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ytInitialPlayerResponse["']?\]?\s*=\s*"#).unwrap());
static YTPLAYER_CONFIG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ytplayer\.config\s*=\s*").unwrap());
static EMBEDDED_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\\?["'](?:playerResponse|player_response|embedded_player_response)\\?["']\s*:\s*"#)
        .unwrap()
});
static INITIAL_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ytInitialData["']?\]?\s*=\s*"#).unwrap());
static MEDIA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https?:(?:\\?/){2}[A-Za-z0-9.-]+\.googlevideo\.com(?:\\?/)videoplayback\?[^"'\s<>]+"#,
    )
    .unwrap()
});

/// Runs `strategies` in order and returns the first parsed document together
/// with the name of the strategy that produced it.
pub fn extract_document(body: &str, strategies: &[Strategy]) -> Option<(&'static str, Value)> {
    strategies
        .iter()
        .find_map(|s| (s.run)(body).map(|v| (s.name, v)))
}

pub fn extract_player_config(page: &PageDocument) -> RelayResult<PlayerConfig> {
    for strategy in PLAYER_STRATEGIES {
        let Some(value) = (strategy.run)(&page.body) else {
            continue;
        };
        match PlayerConfig::from_value(value) {
            Some(config) => {
                tracing::debug!(
                    "{} page: player config found via '{}'",
                    page.kind,
                    strategy.name
                );
                return Ok(config);
            }
            None => tracing::debug!(
                "{} page: '{}' matched but holds no player data",
                page.kind,
                strategy.name
            ),
        }
    }

    if let Some(config) = media_url_fallback(&page.body).and_then(PlayerConfig::from_value) {
        tracing::warn!(
            "{} page: no structured player config, using bare media URLs",
            page.kind
        );
        return Ok(config);
    }

    Err(RelayError::ConfigNotFound(page.kind.to_string()))
}

fn initial_player_response(body: &str) -> Option<Value> {
    objects_after(body, &PLAYER_RESPONSE_RE)
}

fn initial_data(body: &str) -> Option<Value> {
    objects_after(body, &INITIAL_DATA_RE)
}

/// Legacy `ytplayer.config = {"args": {"player_response": "<json>"}}`.
fn ytplayer_config(body: &str) -> Option<Value> {
    let config = objects_after(body, &YTPLAYER_CONFIG_RE)?;
    let args = config.get("args")?;
    let response = args
        .get("player_response")
        .or_else(|| args.get("raw_player_response"))?;

    match response {
        Value::String(s) => parse_lenient(s),
        Value::Object(_) => Some(response.clone()),
        _ => None,
    }
}

/// `"playerResponse": {...}` or `"embedded_player_response": "<json>"` inside
/// some larger script object.
fn embedded_player_response(body: &str) -> Option<Value> {
    EMBEDDED_RESPONSE_RE.find_iter(body).find_map(|m| {
        let rest = &body[m.end()..];
        match rest.chars().next()? {
            '{' => balanced_object(rest).and_then(parse_lenient),
            '"' => string_literal(rest)
                .and_then(|lit| serde_json::from_str::<String>(lit).ok())
                .and_then(|s| parse_lenient(&s)),
            _ => None,
        }
    })
}

/// The whole body is JSON, as returned by the player endpoint.
fn json_document(body: &str) -> Option<Value> {
    let trimmed = body.trim_start();
    let trimmed = trimmed.strip_prefix(")]}'").unwrap_or(trimmed).trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    parse_lenient(trimmed)
}

fn objects_after(body: &str, marker: &Regex) -> Option<Value> {
    marker.find_iter(body).find_map(|m| {
        let rest = &body[m.end()..];
        if !rest.starts_with('{') {
            return None;
        }
        balanced_object(rest).and_then(parse_lenient)
    })
}

/// Returns the `{...}` prefix of `text` (which must start with `{`), tracking
/// string literals so braces inside them do not count. In a fully escaped
/// object (`{\"key\":...}`) the string delimiter is `\"` and a quote inside
/// a string shows up as `\\\"`.
pub fn balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }
    let escaped = is_escaped_object(text);

    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' if escaped => match bytes.get(i + 1) {
                    Some(b'"') => {
                        in_string = false;
                        i += 1;
                    }
                    Some(b'\\') if bytes.get(i + 2) == Some(&b'\\') => i += 3,
                    _ => i += 1,
                },
                b'\\' => i += 1,
                b'"' if !escaped => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'\\' => {
                    if escaped && bytes.get(i + 1) == Some(&b'"') {
                        in_string = true;
                    }
                    i += 1;
                }
                b'"' if !escaped => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[..=i]);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn is_escaped_object(text: &str) -> bool {
    text.strip_prefix('{')
        .is_some_and(|rest| rest.trim_start().starts_with("\\\""))
}

/// Returns the `"..."` prefix of `text`, escapes included.
fn string_literal(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'"' => return Some(&text[..=i]),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Strict parse first; on failure one cleanup pass and a single retry.
pub fn parse_lenient(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value.is_object().then_some(value);
    }

    let cleaned = cleanup(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::trace!("embedded JSON still invalid after cleanup: {}", e);
            None
        }
    }
}

/// Unescapes an object that arrived escaped (`{\"key\":...}`), then rewrites
/// JS-only string escapes and drops trailing commas. String contents are
/// otherwise left alone.
fn cleanup(raw: &str) -> String {
    let text = if is_escaped_object(raw) {
        unescape_js(raw)
    } else {
        raw.to_string()
    };

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => match chars.next() {
                    Some('\'') => out.push('\''),
                    Some('x') => match hex_escape(&mut chars, 2) {
                        Some('"') => out.push_str("\\\""),
                        Some('\\') => out.push_str("\\\\"),
                        Some(ch) if ch.is_control() => {
                            out.push_str(&format!("\\u{:04x}", ch as u32))
                        }
                        Some(ch) => out.push(ch),
                        None => out.push_str("\\x"),
                    },
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                _ => out.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let rest = chars.clone().find(|ch| !ch.is_whitespace());
                if !matches!(rest, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// One level of JS string unescaping, as applied to an object that was
/// embedded inside a string literal.
fn unescape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(q @ ('"' | '\'' | '\\' | '/')) => out.push(q),
            Some('x') => match hex_escape(&mut chars, 2) {
                Some(ch) => out.push(ch),
                None => out.push_str("\\x"),
            },
            Some('u') => match hex_escape(&mut chars, 4) {
                Some(ch) => out.push(ch),
                None => out.push_str("\\u"),
            },
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Consumes `len` hex digits and returns the character they encode. Nothing
/// is consumed when the digits are not all there.
fn hex_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, len: usize) -> Option<char> {
    let digits: String = chars.clone().take(len).collect();
    if digits.len() != len || !digits.chars().all(|d| d.is_ascii_hexdigit()) {
        return None;
    }
    let ch = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)?;
    for _ in 0..len {
        chars.next();
    }
    Some(ch)
}

/// Builds a minimal player document out of any `googlevideo.com/videoplayback`
/// URLs found in the page. Only URLs that name their itag are kept.
pub fn media_url_fallback(body: &str) -> Option<Value> {
    let mut seen = std::collections::HashSet::new();
    let mut formats = Vec::new();

    for m in MEDIA_URL_RE.find_iter(body) {
        let url = m
            .as_str()
            .replace("\\/", "/")
            .replace("\\u0026", "&")
            .replace("&amp;", "&")
            .trim_end_matches('\\')
            .to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let Some(itag) = query_param(&url, "itag").and_then(|v| v.parse::<u64>().ok()) else {
            continue;
        };
        let mime = query_param(&url, "mime").unwrap_or_else(|| "video/mp4".to_string());
        let mut entry = json!({ "itag": itag, "mimeType": mime, "url": url });
        if let Some(clen) = query_param(&url, "clen") {
            entry["contentLength"] = json!(clen);
        }
        formats.push(entry);
    }

    if formats.is_empty() {
        return None;
    }
    Some(json!({ "streamingData": { "formats": formats } }))
}

fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| {
            urlencoding::decode(v)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
    })
}

use serde::Serialize;
use serde_json::Value;

use crate::sources::youtube::extractor::{INITIAL_DATA_STRATEGIES, extract_document};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    /// Seconds; `None` for live streams and entries without a length.
    pub duration: Option<u64>,
    pub channel: Option<String>,
    pub views: Option<u64>,
    pub url: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    pub fn new(query: &str, mut results: Vec<SearchResult>, limit: usize) -> Self {
        results.truncate(limit);
        Self {
            query: query.to_string(),
            total_results: results.len(),
            results,
        }
    }
}

/// Clamps a requested limit to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Pulls `ytInitialData` out of a results page and collects its video
/// entries. A page without the document yields no results.
pub fn parse_results_page(body: &str) -> Vec<SearchResult> {
    let Some((strategy, data)) = extract_document(body, INITIAL_DATA_STRATEGIES) else {
        tracing::debug!("results page carried no initial data");
        return Vec::new();
    };
    tracing::trace!("initial data found via {}", strategy);
    collect_results(&data)
}

pub fn collect_results(data: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let Some(sections) = find_section_list(data)
        .and_then(|list| list.get("contents"))
        .and_then(Value::as_array)
    else {
        return results;
    };

    for section in sections {
        let items = section
            .get("itemSectionRenderer")
            .and_then(|i| i.get("contents"))
            .and_then(Value::as_array);
        for item in items.into_iter().flatten() {
            if let Some(result) = extract_result(item) {
                results.push(result);
            }
        }
    }
    results
}

fn find_section_list(value: &Value) -> Option<&Value> {
    if let Some(list) = value.get("sectionListRenderer") {
        return Some(list);
    }
    if let Some(primary) = value
        .get("twoColumnSearchResultsRenderer")
        .and_then(|t| t.get("primaryContents"))
    {
        return find_section_list(primary);
    }
    if let Some(contents) = value.get("contents") {
        if let Some(list) = find_section_list(contents) {
            return Some(list);
        }
    }
    if let Some(arr) = value.as_array() {
        return arr.iter().find_map(find_section_list);
    }
    None
}

fn extract_result(item: &Value) -> Option<SearchResult> {
    let renderer = item.get("videoRenderer")?;
    let video_id = renderer.get("videoId").and_then(Value::as_str)?;
    let title = renderer.get("title").and_then(get_text)?;

    let channel = ["ownerText", "longBylineText", "shortBylineText"]
        .iter()
        .find_map(|key| renderer.get(*key).and_then(get_text))
        .filter(|c| !c.is_empty());

    let duration = renderer
        .get("lengthText")
        .and_then(get_text)
        .and_then(|s| parse_duration(&s));

    let views = renderer
        .get("viewCountText")
        .and_then(get_text)
        .and_then(|s| parse_count(&s));

    Some(SearchResult {
        video_id: video_id.to_string(),
        title,
        duration,
        channel,
        views,
        url: format!("https://www.youtube.com/watch?v={}", video_id),
        thumbnail: get_thumbnail(renderer),
    })
}

fn get_text(obj: &Value) -> Option<String> {
    if let Some(s) = obj.as_str() {
        return Some(s.to_string());
    }
    if let Some(simple_text) = obj.get("simpleText").and_then(Value::as_str) {
        return Some(simple_text.to_string());
    }
    let runs = obj.get("runs").and_then(Value::as_array)?;
    Some(
        runs.iter()
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .collect(),
    )
}

/// "1:02:03" → 3723. Any non-numeric part makes the whole thing unknown.
fn parse_duration(s: &str) -> Option<u64> {
    s.trim()
        .split(':')
        .try_fold(0u64, |acc, part| {
            let n = part.trim().parse::<u64>().ok()?;
            acc.checked_mul(60)?.checked_add(n)
        })
}

/// "1,234,567 views" → 1234567; "No views" → `None`.
fn parse_count(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn get_thumbnail(renderer: &Value) -> Option<String> {
    renderer
        .get("thumbnail")
        .and_then(|t| t.get("thumbnails"))
        .and_then(Value::as_array)
        .and_then(|arr| arr.last())
        .and_then(|thumb| thumb.get("url"))
        .and_then(Value::as_str)
        .map(|s| s.split('?').next().unwrap_or(s).to_string())
}

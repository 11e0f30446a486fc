use axum::http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE},
};

pub const SIGNATURE_UNCERTAIN: HeaderName = HeaderName::from_static("x-signature-uncertain");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Download with the given (unsanitized) file name.
    Attachment(String),
    Inline,
}

impl Disposition {
    pub fn header_value(&self) -> HeaderValue {
        match self {
            Disposition::Inline => HeaderValue::from_static("inline"),
            Disposition::Attachment(name) => {
                let name = sanitize_filename(name);
                let fallback: String = name
                    .chars()
                    .map(|c| if c.is_ascii() { c } else { '_' })
                    .collect();
                let value = format!(
                    "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                    fallback,
                    urlencoding::encode(&name)
                );
                HeaderValue::from_str(&value)
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
            }
        }
    }
}

/// Strips characters that are unsafe in file names or in a quoted header
/// parameter. Never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(*c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Response headers for a relayed body. `upstream` is the upstream response's
/// header map; `content_type` falls back to whatever upstream declared.
pub fn relay_headers(
    upstream: &HeaderMap,
    content_type: &str,
    disposition: &Disposition,
    signature_uncertain: bool,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let declared = HeaderValue::from_str(content_type)
        .ok()
        .filter(|_| !content_type.is_empty());
    let content_type = declared
        .or_else(|| upstream.get(CONTENT_TYPE).cloned())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(CONTENT_TYPE, content_type);

    headers.insert(CONTENT_DISPOSITION, disposition.header_value());
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    // copied from upstream as-is
    for name in [CONTENT_LENGTH, CONTENT_RANGE, ACCEPT_RANGES] {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    if signature_uncertain {
        headers.insert(SIGNATURE_UNCERTAIN, HeaderValue::from_static("1"));
    }
    headers
}

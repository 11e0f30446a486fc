use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::common::{RelayError, RelayResult};

/// An 11-character video identifier. Only its shape is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

// Each pattern captures exactly 11 id characters and then requires a
// non-id character or the end of input, so a longer token never matches.
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // watch URLs, `v=` anywhere in the query
        r"^(?:https?://)?(?:(?:www|m|music)\.)?youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        // short links
        r"^(?:https?://)?(?:www\.)?youtu\.be/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        // embed-style paths
        r"^(?:https?://)?(?:(?:www|m)\.)?youtube(?:-nocookie)?\.com/(?:embed|v|e)/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        // shorts and live paths
        r"^(?:https?://)?(?:(?:www|m)\.)?youtube\.com/(?:shorts|live)/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        // bare id
        r"^([A-Za-z0-9_-]{11})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("video id pattern must compile"))
    .collect()
});

impl VideoId {
    /// Extracts the identifier from any accepted URL shape or a bare id.
    pub fn parse(input: &str) -> RelayResult<Self> {
        let input = input.trim();

        PATTERNS
            .iter()
            .find_map(|re| re.captures(input))
            .and_then(|caps| caps.get(1))
            .map(|m| VideoId(m.as_str().to_string()))
            .ok_or_else(|| {
                RelayError::InvalidInput(format!("not a YouTube URL or video id: '{}'", input))
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

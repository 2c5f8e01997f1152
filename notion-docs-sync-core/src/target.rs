//! Destination page resolution: turns the destination URL given on the
//! command line into the Notion page id documents are published under.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("destination is empty")]
    Empty,
    #[error("no Notion page id found in destination {0:?}")]
    NoPageId(String),
}

/// A Notion page id: 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

fn page_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([0-9a-f]{32})$").expect("static regex is valid"))
}

impl PageId {
    /// Extract the page id from a Notion URL or a bare id.
    ///
    /// Accepted forms:
    /// - `https://www.notion.so/workspace/Page-Title-<id>`
    /// - `https://www.notion.so/<id>?v=...` and peek links `...?p=<id>`
    /// - `<id>` with or without hyphens
    pub fn from_url(destination: &str) -> Result<Self, TargetError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(TargetError::Empty);
        }

        let without_fragment = destination.split('#').next().unwrap_or(destination);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        // A peek link names the opened page in `p`, which wins over the path.
        if let Some(query) = query {
            for pair in query.split('&') {
                if let Some(value) = pair.strip_prefix("p=") {
                    if let Some(id) = Self::from_segment(value) {
                        return Ok(id);
                    }
                }
            }
        }

        let last_segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        Self::from_segment(last_segment)
            .ok_or_else(|| TargetError::NoPageId(destination.to_string()))
    }

    fn from_segment(segment: &str) -> Option<Self> {
        let compact = segment.replace('-', "");
        page_id_pattern()
            .captures(&compact)
            .map(|c| PageId(c[1].to_lowercase()))
    }

    /// The id in the hyphenated 8-4-4-4-12 form the API returns.
    pub fn hyphenated(&self) -> String {
        let s = &self.0;
        format!(
            "{}-{}-{}-{}-{}",
            &s[0..8],
            &s[8..12],
            &s[12..16],
            &s[16..20],
            &s[20..32]
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hyphenated())
    }
}

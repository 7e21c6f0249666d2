use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Result, StoryError};

const SHORT_LINK_HOST: &str = "youtu.be";

static SHORT_LINK_RE: OnceLock<Regex> = OnceLock::new();
static QUERY_PARAM_RE: OnceLock<Regex> = OnceLock::new();

/// Opaque video token, only ever used as a lookup key for comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pulls the video id out of a short link (`youtu.be/<id>`) or a full link
/// (`...?v=<id>`). The id runs up to the next `&` or the end of the string.
pub fn extract_video_id(url: &str) -> Result<VideoId> {
    let re = if url.contains(SHORT_LINK_HOST) {
        SHORT_LINK_RE.get_or_init(|| Regex::new(r"youtu\.be/([^&]+)").expect("valid regex"))
    } else {
        QUERY_PARAM_RE.get_or_init(|| Regex::new(r"v=([^&]+)").expect("valid regex"))
    };

    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId::new(m.as_str()))
        .ok_or_else(|| StoryError::InvalidVideoUrl {
            url: url.to_string(),
        })
}

use std::env;

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_PORT: &str = "7860";

/// Process-wide settings, read once at startup and never mutated.
///
/// Missing keys are not rejected here; they surface later as authentication
/// errors from the upstream APIs.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub youtube_api_key: String,
    pub youtube_api_url: String,
    pub port: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Self {
            openai_api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
            openai_api_url: or("OPENAI_API_URL", DEFAULT_OPENAI_API_URL),
            openai_model: or("OPENAI_MODEL", DEFAULT_MODEL),
            youtube_api_key: lookup("YOUTUBE_API_KEY").unwrap_or_default(),
            youtube_api_url: or("YOUTUBE_API_URL", DEFAULT_YOUTUBE_API_URL),
            port: or("PORT", DEFAULT_PORT),
        }
    }

    pub fn openai_configured(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    pub fn youtube_configured(&self) -> bool {
        !self.youtube_api_key.is_empty()
    }
}

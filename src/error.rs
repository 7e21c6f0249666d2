use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Could not find a video id in URL: {url}")]
    InvalidVideoUrl { url: String },

    #[error("Creativity must be between 0.0 and 2.0, got {0}")]
    InvalidCreativity(f64),

    #[error("Comment source returned {status}: {body}")]
    CommentSource { status: u16, body: String },

    #[error("Text generation failed with {status}: {body}")]
    Generation { status: u16, body: String },

    #[error("Text generation returned no choices")]
    EmptyCompletion,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoryError>;

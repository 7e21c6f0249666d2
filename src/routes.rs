use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, Json as AxumJson},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::comments::{CommentSource, YouTubeClient};
use crate::config::Config;
use crate::error::StoryError;
use crate::pipeline::{tell_story, StoryRequest};
use crate::story::{CompletionBackend, OpenAiClient};

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub comments: Arc<dyn CommentSource>,
    pub writer: Arc<dyn CompletionBackend>,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let comments = YouTubeClient::new(&config.youtube_api_url, &config.youtube_api_key);
        let writer = OpenAiClient::new(&config.openai_api_url, &config.openai_api_key);
        Self {
            config: Arc::new(config),
            comments: Arc::new(comments),
            writer: Arc::new(writer),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

#[derive(Debug, Serialize)]
struct StoryResponse {
    story: String,
    video_id: String,
    comments_used: usize,
    comments_partial: bool,
    generated_at: DateTime<Utc>,
}

fn status_for(err: &StoryError) -> StatusCode {
    match err {
        StoryError::InvalidVideoUrl { .. } | StoryError::InvalidCreativity(_) => {
            StatusCode::BAD_REQUEST
        }
        StoryError::Generation { .. }
        | StoryError::EmptyCompletion
        | StoryError::Http(_)
        | StoryError::Json(_) => StatusCode::BAD_GATEWAY,
        StoryError::CommentSource { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn create_story(
    State(state): State<AppState>,
    Json(payload): Json<StoryRequest>,
) -> Result<AxumJson<StoryResponse>, (StatusCode, AxumJson<ApiError>)> {
    match tell_story(
        state.comments.as_ref(),
        state.writer.as_ref(),
        &state.config.openai_model,
        &payload,
    )
    .await
    {
        Ok(outcome) => {
            info!(
                "Story ready for video {} from {} comments",
                outcome.video_id, outcome.comments_used
            );
            Ok(AxumJson(StoryResponse {
                story: outcome.story,
                video_id: outcome.video_id.to_string(),
                comments_used: outcome.comments_used,
                comments_partial: outcome.comments_partial,
                generated_at: Utc::now(),
            }))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_client_error() {
                warn!("Rejected story request for {}: {}", payload.video_url, e);
            } else {
                error!("Story generation failed for {}: {}", payload.video_url, e);
            }
            Err((status, AxumJson(ApiError { error: e.to_string() })))
        }
    }
}

async fn health_check(State(state): State<AppState>) -> AxumJson<HashMap<String, String>> {
    let mut response = HashMap::new();
    response.insert("status".to_string(), "healthy".to_string());
    response.insert("service".to_string(), "comment-stories".to_string());
    response.insert(
        "openai_configured".to_string(),
        state.config.openai_configured().to_string(),
    );
    response.insert(
        "youtube_configured".to_string(),
        state.config.youtube_configured().to_string(),
    );

    AxumJson(response)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/story", post(create_story))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

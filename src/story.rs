use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Result, StoryError};

/// Word budget for the comment text embedded in the prompt.
pub const MAX_PROMPT_WORDS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub n: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_first_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(StoryError::EmptyCompletion)
    }
}

/// A chat-completion endpoint that answers with the text of one completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String>;
}

pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Chat completion returned error: {} - {}", status, body);
            return Err(StoryError::Generation {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        parsed.into_first_content()
    }
}

/// Joins whole comments, in order, until the next one would take the total
/// past `MAX_PROMPT_WORDS`. Comments are never split.
pub fn combine_comments(comments: &[String]) -> String {
    let mut words: Vec<&str> = Vec::new();

    for comment in comments {
        let comment_words: Vec<&str> = comment.split_whitespace().collect();
        if words.len() + comment_words.len() > MAX_PROMPT_WORDS {
            break;
        }
        words.extend(comment_words);
    }

    words.join(" ")
}

pub fn build_messages(comments_text: &str) -> Vec<ChatMessage> {
    let instruction = format!(
        "Read the comments below and work out the emotions the people who wrote them are \
         feeling. Pick one of those emotions at random and write a short story in the first \
         person that evokes it. The narrator can be young or old, and the story can be set in \
         the past or the future. Keep the words simple, a little profound, but simple overall. \
         Give more weight to the comments that come earlier in the list. \
         The comments are: {comments_text}"
    );

    let constraints = "Ignore comments that only quote song lyrics. \
         Ignore comments like 'anyone listening in 2024'. \
         Keep the story between 50 and 120 words. \
         Do not name the emotion you picked, just start the story. \
         Sometimes describe how this song makes the narrator feel, and be nostalgic about a \
         feeling or a place it takes them to. \
         Choose at random whether the story ends with a hopeful future, a dark turn or something humorous. \
         Never start the story with the first time the narrator heard this song.";

    vec![
        ChatMessage::new("system", instruction),
        ChatMessage::new("assistant", constraints),
    ]
}

pub fn build_request(model: &str, comments: &[String], creativity: f64) -> ChatCompletionRequest {
    let comments_text = combine_comments(comments);
    debug!(
        "Prompt carries {} words from {} comments",
        comments_text.split_whitespace().count(),
        comments.len()
    );

    ChatCompletionRequest {
        model: model.to_string(),
        messages: build_messages(&comments_text),
        temperature: creativity,
        n: 1,
    }
}

/// Asks the backend for a story built from `comments`. Upstream failures are
/// returned to the caller as-is.
pub async fn generate_story(
    backend: &dyn CompletionBackend,
    model: &str,
    comments: &[String],
    creativity: f64,
) -> Result<String> {
    let request = build_request(model, comments, creativity);
    let story = backend.complete(&request).await?;
    info!("Generated story of {} words", story.split_whitespace().count());
    Ok(story)
}

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::{Result, StoryError};
use crate::video_id::VideoId;

pub const FIRST_PAGE_SIZE: u32 = 200;
pub const NEXT_PAGE_SIZE: u32 = 100;
pub const MAX_COMMENTS: usize = 1000;
pub const TOP_COMMENTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub like_count: u64,
}

#[derive(Debug, Default)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub next_page_token: Option<String>,
    /// Conversion stopped at a malformed item; `comments` holds the items before it.
    pub item_error: Option<StoryError>,
}

/// One page of top-level comments for a video.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn list_page(
        &self,
        video_id: &VideoId,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<CommentPage>;
}

// YouTube Data API v3 commentThreads.list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadList {
    items: Vec<serde_json::Value>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_original: String,
    like_count: u64,
}

impl From<CommentThreadList> for CommentPage {
    fn from(list: CommentThreadList) -> Self {
        let mut page = CommentPage {
            next_page_token: list.next_page_token,
            ..Default::default()
        };

        for item in list.items {
            match serde_json::from_value::<CommentThread>(item) {
                Ok(thread) => {
                    let snippet = thread.snippet.top_level_comment.snippet;
                    page.comments.push(Comment {
                        text: snippet.text_original,
                        like_count: snippet.like_count,
                    });
                }
                Err(e) => {
                    page.item_error = Some(e.into());
                    break;
                }
            }
        }

        page
    }
}

pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl CommentSource for YouTubeClient {
    async fn list_page(
        &self,
        video_id: &VideoId,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<CommentPage> {
        let url = format!("{}/commentThreads", self.base_url);
        let max_results = max_results.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id.as_str()),
            ("maxResults", max_results.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoryError::CommentSource {
                status: status.as_u16(),
                body,
            });
        }

        let list: CommentThreadList = serde_json::from_str(&body)?;
        Ok(list.into())
    }
}

/// Best-effort result of paging through a video's comments.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub comments: Vec<Comment>,
    /// Set when paging stopped early because of an error.
    pub failure: Option<String>,
}

impl FetchOutcome {
    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }
}

/// Pages through comments until the source runs dry or `MAX_COMMENTS` are
/// held. Errors never escape: whatever was collected before the failure is
/// returned along with the failure message.
pub async fn fetch_comments(source: &dyn CommentSource, video_id: &VideoId) -> FetchOutcome {
    let mut comments = Vec::new();

    match collect_pages(source, video_id, &mut comments).await {
        Ok(()) => {
            info!("Fetched {} comments for video {}", comments.len(), video_id);
            FetchOutcome {
                comments,
                failure: None,
            }
        }
        Err(e) => {
            error!(
                "Comment fetch for video {} stopped after {} comments: {}",
                video_id,
                comments.len(),
                e
            );
            FetchOutcome {
                comments,
                failure: Some(e.to_string()),
            }
        }
    }
}

async fn collect_pages(
    source: &dyn CommentSource,
    video_id: &VideoId,
    comments: &mut Vec<Comment>,
) -> Result<()> {
    let page = source.list_page(video_id, None, FIRST_PAGE_SIZE).await?;
    comments.extend(page.comments);
    if let Some(e) = page.item_error {
        return Err(e);
    }
    let mut next_page_token = page.next_page_token;

    while let Some(token) = next_page_token.take() {
        if comments.len() >= MAX_COMMENTS {
            break;
        }
        debug!("Requesting next comment page for {} ({} held)", video_id, comments.len());

        let page = source
            .list_page(video_id, Some(token.as_str()), NEXT_PAGE_SIZE)
            .await?;
        let mut capped = false;
        for comment in page.comments {
            comments.push(comment);
            if comments.len() >= MAX_COMMENTS {
                capped = true;
                break;
            }
        }
        // A bad item past the cap is never reached.
        if let (false, Some(e)) = (capped, page.item_error) {
            return Err(e);
        }
        next_page_token = page.next_page_token;
    }

    Ok(())
}

/// Most-liked comments first, ties keep their fetch order.
pub fn select_top_comments(mut comments: Vec<Comment>) -> Vec<String> {
    comments.sort_by(|a, b| b.like_count.cmp(&a.like_count));
    comments
        .into_iter()
        .take(TOP_COMMENTS)
        .map(|c| c.text)
        .collect()
}

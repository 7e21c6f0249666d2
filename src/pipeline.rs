use serde::Deserialize;
use tracing::{info, warn};

use crate::comments::{fetch_comments, select_top_comments, CommentSource};
use crate::error::{Result, StoryError};
use crate::story::{generate_story, CompletionBackend};
use crate::video_id::{extract_video_id, VideoId};

pub const MIN_CREATIVITY: f64 = 0.0;
pub const MAX_CREATIVITY: f64 = 2.0;
pub const DEFAULT_CREATIVITY: f64 = 1.2;

fn default_creativity() -> f64 {
    DEFAULT_CREATIVITY
}

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    pub video_url: String,
    #[serde(default = "default_creativity")]
    pub creativity: f64,
}

#[derive(Debug)]
pub struct StoryOutcome {
    pub story: String,
    pub video_id: VideoId,
    pub comments_used: usize,
    pub comments_partial: bool,
}

/// URL -> comments -> top comments -> story, one step after the other.
pub async fn tell_story(
    source: &dyn CommentSource,
    backend: &dyn CompletionBackend,
    model: &str,
    request: &StoryRequest,
) -> Result<StoryOutcome> {
    if !(MIN_CREATIVITY..=MAX_CREATIVITY).contains(&request.creativity) {
        return Err(StoryError::InvalidCreativity(request.creativity));
    }

    let video_id = extract_video_id(&request.video_url)?;
    info!("Telling a story for video {}", video_id);

    let fetched = fetch_comments(source, &video_id).await;
    if fetched.is_partial() {
        warn!(
            "Continuing with {} comments for video {}",
            fetched.comments.len(),
            video_id
        );
    }
    let comments_partial = fetched.is_partial();

    let top = select_top_comments(fetched.comments);
    let story = generate_story(backend, model, &top, request.creativity).await?;

    Ok(StoryOutcome {
        story,
        video_id,
        comments_used: top.len(),
        comments_partial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{Comment, CommentPage};
    use crate::story::ChatCompletionRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct OnePage(Vec<Comment>);

    #[async_trait]
    impl CommentSource for OnePage {
        async fn list_page(
            &self,
            _video_id: &VideoId,
            _page_token: Option<&str>,
            _max_results: u32,
        ) -> Result<CommentPage> {
            Ok(CommentPage {
                comments: self.0.clone(),
                next_page_token: None,
                item_error: None,
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl CommentSource for Broken {
        async fn list_page(
            &self,
            _video_id: &VideoId,
            _page_token: Option<&str>,
            _max_results: u32,
        ) -> Result<CommentPage> {
            Err(StoryError::CommentSource {
                status: 500,
                body: "backendError".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct Echo {
        seen: Mutex<Option<ChatCompletionRequest>>,
    }

    #[async_trait]
    impl CompletionBackend for Echo {
        async fn complete(&self, request: &ChatCompletionRequest) -> Result<String> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok("a story".to_string())
        }
    }

    fn request(url: &str, creativity: f64) -> StoryRequest {
        StoryRequest {
            video_url: url.to_string(),
            creativity,
        }
    }

    #[tokio::test]
    async fn runs_end_to_end() {
        let source = OnePage(vec![
            Comment {
                text: "quiet one".to_string(),
                like_count: 2,
            },
            Comment {
                text: "loud one".to_string(),
                like_count: 90,
            },
        ]);
        let backend = Echo::default();

        let outcome = tell_story(
            &source,
            &backend,
            "gpt-3.5-turbo",
            &request("https://youtu.be/ABC123", 0.9),
        )
        .await
        .unwrap();

        assert_eq!(outcome.story, "a story");
        assert_eq!(outcome.video_id.as_str(), "ABC123");
        assert_eq!(outcome.comments_used, 2);
        assert!(!outcome.comments_partial);

        let seen = backend.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.temperature, 0.9);
        assert!(seen.messages[0].content.ends_with("loud one quiet one"));
    }

    #[tokio::test]
    async fn comment_failure_still_produces_a_story() {
        let backend = Echo::default();
        let outcome = tell_story(
            &Broken,
            &backend,
            "m",
            &request("https://www.youtube.com/watch?v=XYZ", 1.2),
        )
        .await
        .unwrap();

        assert_eq!(outcome.comments_used, 0);
        assert!(outcome.comments_partial);
    }

    #[tokio::test]
    async fn url_reaches_the_extractor_unchanged() {
        let outcome = tell_story(
            &Broken,
            &Echo::default(),
            "m",
            &request("https://youtu.be/ABC123 ", 1.0),
        )
        .await
        .unwrap();
        assert_eq!(outcome.video_id.as_str(), "ABC123 ");
    }

    #[tokio::test]
    async fn bad_url_fails_before_any_fetch() {
        let err = tell_story(&Broken, &Echo::default(), "m", &request("not a link", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::InvalidVideoUrl { .. }));
    }

    #[tokio::test]
    async fn creativity_out_of_range_is_rejected() {
        for creativity in [-0.1, 2.5, f64::NAN] {
            let err = tell_story(
                &Broken,
                &Echo::default(),
                "m",
                &request("https://youtu.be/ABC123", creativity),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, StoryError::InvalidCreativity(_)));
        }
    }

    #[test]
    fn creativity_defaults_when_omitted() {
        let req: StoryRequest =
            serde_json::from_str(r#"{"video_url": "https://youtu.be/ABC123"}"#).unwrap();
        assert_eq!(req.creativity, DEFAULT_CREATIVITY);
    }
}

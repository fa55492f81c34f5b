use crate::auth::identity::Identity;
use crate::models::post::{NewPost, Post, PostCategory, PostWithAuthor};
use crate::repositories::{PostRepository, RepositoryError};
use crate::services::notification::{BroadcastOutcome, NotificationDispatcher};
use crate::validation::{optional, ValidationErrors};
use chrono::NaiveDate;
use std::sync::Arc;

pub const FEATURED_POST_LIMIT: i64 = 3;
const MAX_TITLE_LENGTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Invalid post: {0}")]
    Invalid(ValidationErrors),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

#[derive(Debug, Clone, Default)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_featured: bool,
    /// `YYYY-MM-DD`
    pub event_date: Option<String>,
    pub location: Option<String>,
}

impl CreatePostRequest {
    fn validate(&self) -> Result<PostCategory, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require("title", &self.title, "Title is required");
        if self.title.trim().chars().count() > MAX_TITLE_LENGTH {
            errors.add(
                "title",
                format!("Title must be at most {MAX_TITLE_LENGTH} characters"),
            );
        }
        errors.require("content", &self.content, "Content is required");

        let category = self.category.parse::<PostCategory>().ok();
        if category.is_none() {
            errors.add("category", "Invalid category");
        }

        if let Some(date) = self.event_date.as_deref().map(str::trim) {
            if !date.is_empty() && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                errors.add("event_date", "Event date must be formatted YYYY-MM-DD");
            }
        }

        errors.into_result()?;
        category.ok_or_else(|| ValidationErrors::single("category", "Invalid category"))
    }
}

/// A stored post and what happened to its subscriber broadcast.
#[derive(Debug)]
pub struct PublishedPost {
    pub post: Post,
    /// `None` when the broadcast failed; the post is kept regardless.
    pub broadcast: Option<BroadcastOutcome>,
}

pub struct PostService {
    repository: Arc<dyn PostRepository>,
    notifier: Arc<NotificationDispatcher>,
}

impl PostService {
    pub fn new(repository: Arc<dyn PostRepository>, notifier: Arc<NotificationDispatcher>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Stores the post, then notifies active subscribers. Broadcast failures
    /// are logged and never undo the stored post. Only admins may feature a
    /// post.
    pub async fn create_post(
        &self,
        author: &Identity,
        request: CreatePostRequest,
    ) -> Result<PublishedPost, PostServiceError> {
        let category = request.validate().map_err(PostServiceError::Invalid)?;

        let new_post = NewPost {
            title: request.title.trim().to_string(),
            content: request.content.trim().to_string(),
            category,
            user_id: author.user_id,
            is_featured: request.is_featured && author.is_admin,
            event_date: optional(request.event_date),
            location: optional(request.location),
        };

        let post = self.repository.create_post(&new_post).await?;
        tracing::info!("User {} published post {}", author.username, post.id);

        let broadcast = match self.notifier.broadcast_post(&post).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Failed to notify subscribers about post {}: {}", post.id, e);
                None
            }
        };

        Ok(PublishedPost { post, broadcast })
    }

    pub async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, PostServiceError> {
        Ok(self.repository.list_posts().await?)
    }

    pub async fn featured_posts(&self) -> Result<Vec<PostWithAuthor>, PostServiceError> {
        Ok(self.repository.list_featured(FEATURED_POST_LIMIT).await?)
    }

    pub async fn posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, PostServiceError> {
        Ok(self.repository.posts_by_user(user_id).await?)
    }
}

use crate::repositories::{PostRepository, RepositoryError};
use crate::services::email_service::Newsletter;
use crate::services::notification::{NewsletterReport, NotificationDispatcher, NotificationError};
use crate::validation::optional;
use std::sync::Arc;

/// How many of the latest posts an edition carries.
pub const NEWSLETTER_POST_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

pub struct NewsletterService {
    posts: Arc<dyn PostRepository>,
    notifier: Arc<NotificationDispatcher>,
}

impl NewsletterService {
    pub fn new(posts: Arc<dyn PostRepository>, notifier: Arc<NotificationDispatcher>) -> Self {
        Self { posts, notifier }
    }

    /// Builds the current edition. A blank note is dropped.
    pub async fn compose(&self, personal_note: Option<String>) -> Result<Newsletter, NewsletterError> {
        let mut posts = self.posts.list_posts().await?;
        posts.retain(|entry| entry.post.is_published);
        posts.truncate(NEWSLETTER_POST_LIMIT);

        Ok(Newsletter::new(optional(personal_note), posts))
    }

    /// Composes and mails the edition. `selected` narrows the run to those
    /// active subscribers; empty means everyone active.
    pub async fn send(
        &self,
        personal_note: Option<String>,
        selected: &[String],
    ) -> Result<NewsletterReport, NewsletterError> {
        let newsletter = self.compose(personal_note).await?;
        Ok(self.notifier.send_newsletter(&newsletter, selected).await?)
    }
}

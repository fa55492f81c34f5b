use crate::models::{Contact, Post};
use crate::repositories::{RepositoryError, SubscriptionRepository};
use crate::services::email_service::{EmailError, EmailService, Newsletter};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to load recipients: {0}")]
    Recipients(#[from] RepositoryError),
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Result of a post broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// One message went out addressed to this many subscribers.
    Sent(usize),
    /// No active subscriber with a usable address; nothing was sent.
    NoRecipients,
}

/// Per-recipient tally of a newsletter run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NewsletterReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Turns domain events into outgoing mail. Every event gets at most one
/// delivery attempt.
pub struct NotificationDispatcher {
    email_service: Arc<dyn EmailService>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl NotificationDispatcher {
    pub fn new(
        email_service: Arc<dyn EmailService>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            email_service,
            subscriptions,
        }
    }

    pub async fn welcome_subscriber(&self, email: &str) -> Result<(), NotificationError> {
        self.email_service.send_welcome(email).await?;
        tracing::info!("Sent welcome email to {}", email);
        Ok(())
    }

    /// Sends `post` to every currently active subscriber in one message.
    /// Recipients are read once, at call time.
    pub async fn broadcast_post(&self, post: &Post) -> Result<BroadcastOutcome, NotificationError> {
        let recipients = self.subscriptions.active_emails().await?;
        if recipients.is_empty() {
            tracing::debug!("No active subscribers; skipping broadcast for post {}", post.id);
            return Ok(BroadcastOutcome::NoRecipients);
        }

        let addressed = self
            .email_service
            .send_post_broadcast(&recipients, post)
            .await?;

        if addressed < recipients.len() {
            tracing::warn!(
                "Post {} broadcast skipped {} unusable subscriber address(es)",
                post.id,
                recipients.len() - addressed
            );
        }
        if addressed == 0 {
            return Ok(BroadcastOutcome::NoRecipients);
        }

        tracing::info!("Broadcast post {} to {} subscriber(s)", post.id, addressed);
        Ok(BroadcastOutcome::Sent(addressed))
    }

    /// Sends a personal copy of `newsletter` to each active subscriber, or
    /// only to the active ones in `selected` when it is not empty. One
    /// failed copy does not stop the rest.
    pub async fn send_newsletter(
        &self,
        newsletter: &Newsletter,
        selected: &[String],
    ) -> Result<NewsletterReport, NotificationError> {
        let mut recipients = self.subscriptions.active_emails().await?;
        if !selected.is_empty() {
            recipients.retain(|email| {
                selected
                    .iter()
                    .any(|chosen| chosen.trim().eq_ignore_ascii_case(email))
            });
        }

        let mut report = NewsletterReport {
            total: recipients.len(),
            ..NewsletterReport::default()
        };
        for email in &recipients {
            match self.email_service.send_newsletter(email, newsletter).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Newsletter to {} failed: {}", email, e);
                }
            }
        }

        tracing::info!(
            "Newsletter run finished: {} sent, {} failed of {}",
            report.sent,
            report.failed,
            report.total
        );
        Ok(report)
    }

    pub async fn notify_operator(&self, contact: &Contact) -> Result<(), NotificationError> {
        self.email_service.send_contact_notification(contact).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostCategory;
    use crate::repositories::subscription_repository::MockSubscriptionRepository;
    use crate::test_utils::test_helpers::RecordingEmailService;

    fn post() -> Post {
        Post {
            id: 11,
            title: "Bulk pickup moved".to_string(),
            content: "Bulk pickup is now on Thursdays.".to_string(),
            category: PostCategory::Update,
            user_id: 1,
            is_published: true,
            is_featured: false,
            event_date: None,
            location: None,
            created_at: None,
        }
    }

    fn repo_with(emails: Vec<&'static str>) -> MockSubscriptionRepository {
        let mut mock_repo = MockSubscriptionRepository::new();
        mock_repo.expect_active_emails().times(1).returning(move || {
            let emails = emails.iter().map(|e| e.to_string()).collect();
            Box::pin(async move { Ok(emails) })
        });
        mock_repo
    }

    #[tokio::test]
    async fn test_broadcast_sends_one_message_to_all_active() {
        let email = Arc::new(RecordingEmailService::new());
        let dispatcher = NotificationDispatcher::new(
            email.clone(),
            Arc::new(repo_with(vec!["a@example.com", "b@example.com", "c@example.com"])),
        );

        let outcome = dispatcher.broadcast_post(&post()).await.unwrap();
        assert_eq!(outcome, BroadcastOutcome::Sent(3));

        let broadcasts = email.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].recipients.len(), 3);
        assert_eq!(broadcasts[0].post_title, "Bulk pickup moved");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_sends_nothing() {
        let email = Arc::new(RecordingEmailService::new());
        let dispatcher = NotificationDispatcher::new(email.clone(), Arc::new(repo_with(vec![])));

        let outcome = dispatcher.broadcast_post(&post()).await.unwrap();
        assert_eq!(outcome, BroadcastOutcome::NoRecipients);
        assert!(email.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_reports_only_addressed_subscribers() {
        let email = Arc::new(RecordingEmailService::new());
        let dispatcher = NotificationDispatcher::new(
            email.clone(),
            Arc::new(repo_with(vec!["a,b@example.com", "c@example.com"])),
        );

        let outcome = dispatcher.broadcast_post(&post()).await.unwrap();
        assert_eq!(outcome, BroadcastOutcome::Sent(1));
    }

    #[tokio::test]
    async fn test_broadcast_with_only_unusable_addresses_is_no_recipients() {
        let email = Arc::new(RecordingEmailService::new());
        let dispatcher =
            NotificationDispatcher::new(email.clone(), Arc::new(repo_with(vec!["a,b@example.com"])));

        let outcome = dispatcher.broadcast_post(&post()).await.unwrap();
        assert_eq!(outcome, BroadcastOutcome::NoRecipients);
    }

    fn edition() -> Newsletter {
        Newsletter::new(Some("Thanks for showing up!".to_string()), Vec::new())
    }

    #[tokio::test]
    async fn test_newsletter_sends_one_copy_per_subscriber() {
        let email = Arc::new(RecordingEmailService::new());
        let dispatcher = NotificationDispatcher::new(
            email.clone(),
            Arc::new(repo_with(vec!["a@example.com", "b@example.com"])),
        );

        let report = dispatcher.send_newsletter(&edition(), &[]).await.unwrap();
        assert_eq!(
            report,
            NewsletterReport {
                total: 2,
                sent: 2,
                failed: 0
            }
        );

        let sent = email.newsletters();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@example.com");
        assert_eq!(sent[1].to, "b@example.com");
        assert_eq!(sent[0].personal_note.as_deref(), Some("Thanks for showing up!"));
    }

    #[tokio::test]
    async fn test_newsletter_selection_is_limited_to_active_subscribers() {
        let email = Arc::new(RecordingEmailService::new());
        let dispatcher = NotificationDispatcher::new(
            email.clone(),
            Arc::new(repo_with(vec!["a@example.com", "b@example.com", "c@example.com"])),
        );

        let selected = vec![" B@example.com".to_string(), "stranger@example.com".to_string()];
        let report = dispatcher.send_newsletter(&edition(), &selected).await.unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.sent, 1);
        let sent: Vec<String> = email.newsletters().into_iter().map(|n| n.to).collect();
        assert_eq!(sent, vec!["b@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_newsletter_counts_failures_and_keeps_going() {
        let email = Arc::new(RecordingEmailService::new());
        email.fail_for("a@example.com");
        let dispatcher = NotificationDispatcher::new(
            email.clone(),
            Arc::new(repo_with(vec!["a@example.com", "b@example.com"])),
        );

        let report = dispatcher.send_newsletter(&edition(), &[]).await.unwrap();
        assert_eq!(
            report,
            NewsletterReport {
                total: 2,
                sent: 1,
                failed: 1
            }
        );
        assert_eq!(email.newsletters().len(), 2, "both attempts are recorded");
    }

    #[tokio::test]
    async fn test_broadcast_surfaces_send_failure() {
        let email = Arc::new(RecordingEmailService::failing());
        let dispatcher =
            NotificationDispatcher::new(email.clone(), Arc::new(repo_with(vec!["a@example.com"])));

        let result = dispatcher.broadcast_post(&post()).await;
        assert!(matches!(result, Err(NotificationError::Email(_))));
        assert_eq!(email.broadcasts().len(), 1, "the single attempt is still recorded");
    }
}

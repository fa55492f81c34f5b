use crate::models::subscription::{NewSubscription, Subscription};
use crate::repositories::{RepositoryError, SubscriptionRepository};
use crate::services::notification::NotificationDispatcher;
use crate::validation::{optional, ValidationErrors};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Invalid subscription: {0}")]
    Invalid(ValidationErrors),
    #[error("Subscription not found")]
    NotFound,
    #[error("Welcome email could not be delivered")]
    WelcomeFailed,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

#[derive(Debug, Clone, Default)]
pub struct SubscribeRequest {
    pub email: String,
    pub user_id: Option<i64>,
    pub neighborhood: Option<String>,
    pub preferences: Option<String>,
}

impl SubscribeRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("email", &self.email, "Email is required");
        if !errors.has("email") {
            errors.require_email("email", &self.email);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// New row created and welcome email sent.
    Created,
    /// An inactive row for the address was switched back on.
    Reactivated,
    /// The address is already receiving updates; nothing changed.
    AlreadySubscribed,
}

pub struct SubscriptionService {
    repository: Arc<dyn SubscriptionRepository>,
    notifier: Arc<NotificationDispatcher>,
}

impl SubscriptionService {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    pub async fn subscribe(
        &self,
        request: SubscribeRequest,
    ) -> Result<SubscribeOutcome, SubscriptionError> {
        request.validate().map_err(SubscriptionError::Invalid)?;
        let email = request.email.trim().to_string();

        if let Some(existing) = self.repository.find_by_email(&email).await? {
            return self.resubscribe(existing).await;
        }

        let new_subscription = NewSubscription {
            email: email.clone(),
            user_id: request.user_id,
            neighborhood: optional(request.neighborhood),
            preferences: optional(request.preferences),
        };

        let subscription = match self.repository.create(&new_subscription).await {
            Ok(subscription) => subscription,
            Err(RepositoryError::AlreadyExists(_)) => {
                // A concurrent request inserted the same address first
                tracing::debug!("Concurrent subscribe for {}", email);
                return Ok(SubscribeOutcome::AlreadySubscribed);
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.notifier.welcome_subscriber(&email).await {
            tracing::error!("Welcome email to {} failed, removing subscription: {}", email, e);
            if let Err(e) = self.repository.delete(subscription.id).await {
                tracing::error!(
                    "Failed to remove subscription {} after welcome failure: {}",
                    subscription.id,
                    e
                );
            }
            return Err(SubscriptionError::WelcomeFailed);
        }

        tracing::info!("New subscriber {}", email);
        Ok(SubscribeOutcome::Created)
    }

    async fn resubscribe(
        &self,
        existing: Subscription,
    ) -> Result<SubscribeOutcome, SubscriptionError> {
        if existing.is_active {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        self.repository.set_active(existing.id, true).await?;
        tracing::info!("Reactivated subscription for {}", existing.email);
        Ok(SubscribeOutcome::Reactivated)
    }

    /// Soft-deletes the subscription for `email`. Unknown addresses are
    /// reported as `NotFound` without touching the store.
    pub async fn unsubscribe(&self, email: &str) -> Result<(), SubscriptionError> {
        let subscription = self
            .repository
            .find_by_email(email.trim())
            .await?
            .ok_or(SubscriptionError::NotFound)?;

        if subscription.is_active {
            self.repository.set_active(subscription.id, false).await?;
            tracing::info!("Unsubscribed {}", subscription.email);
        }

        Ok(())
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, SubscriptionError> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn count_active(&self) -> Result<i64, SubscriptionError> {
        Ok(self.repository.count_active().await?)
    }
}

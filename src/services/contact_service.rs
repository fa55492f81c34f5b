use crate::models::Contact;
use crate::services::notification::NotificationDispatcher;
use crate::validation::ValidationErrors;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Invalid contact form: {0}")]
    Invalid(ValidationErrors),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name is required");
        errors.require_email("email", &self.email);
        errors.require("subject", &self.subject, "Subject is required");
        errors.require("message", &self.message, "Message is required");
        errors.into_result()
    }
}

pub struct ContactService {
    pool: SqlitePool,
    notifier: Arc<NotificationDispatcher>,
}

impl ContactService {
    pub fn new(pool: SqlitePool, notifier: Arc<NotificationDispatcher>) -> Self {
        Self { pool, notifier }
    }

    /// Stores the message, then forwards it to the operator. A failed
    /// forward is logged; the stored message is what counts.
    pub async fn submit(&self, request: ContactRequest) -> Result<Contact, ContactError> {
        request.validate().map_err(ContactError::Invalid)?;

        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (name, email, subject, message)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, email, subject, message, created_at
            "#,
        )
        .bind(request.name.trim())
        .bind(request.email.trim())
        .bind(request.subject.trim())
        .bind(request.message.trim())
        .fetch_one(&self.pool)
        .await?;

        if let Err(e) = self.notifier.notify_operator(&contact).await {
            tracing::error!("Failed to forward contact message {}: {}", contact.id, e);
        }

        Ok(contact)
    }
}

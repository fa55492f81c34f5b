use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CSRF_TOKEN_KEY: &str = "csrf_token";

/// Token lifetime in seconds.
const CSRF_TOKEN_TTL: i64 = 86_400;

/// Form token bound to one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    pub value: String,
    pub created_at: i64,
}

impl CsrfToken {
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() - self.created_at > CSRF_TOKEN_TTL
    }
}

impl Default for CsrfToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    #[error("no CSRF token in session")]
    Missing,
    #[error("CSRF token expired")]
    Expired,
    #[error("CSRF token mismatch")]
    Mismatch,
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for CsrfError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            "Invalid security token. Please refresh the page and try again.",
        )
            .into_response()
    }
}

fn prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

/// Generate a new CSRF token and store in session
pub async fn generate_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token = CsrfToken::new();
    let value = token.value.clone();

    session.insert(CSRF_TOKEN_KEY, token).await?;

    debug!("Generated new CSRF token: {}", prefix(&value));
    Ok(value)
}

pub async fn get_or_create_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token: Option<CsrfToken> = session.get(CSRF_TOKEN_KEY).await?;

    match token {
        Some(existing) if !existing.is_expired() => Ok(existing.value),
        _ => generate_csrf_token(session).await,
    }
}

/// Checks a submitted form token against the session and rotates it on
/// success, so each rendered form can be submitted once.
pub async fn validate_csrf_form_field(session: &Session, form_token: &str) -> Result<(), CsrfError> {
    let stored: CsrfToken = session
        .get(CSRF_TOKEN_KEY)
        .await?
        .ok_or_else(|| {
            warn!("No CSRF token in session for form validation");
            CsrfError::Missing
        })?;

    if stored.is_expired() {
        warn!("CSRF token expired during form validation");
        return Err(CsrfError::Expired);
    }

    if form_token != stored.value {
        warn!(
            "CSRF form token mismatch: expected {}, got {}",
            prefix(&stored.value),
            prefix(form_token)
        );
        return Err(CsrfError::Mismatch);
    }

    debug!("CSRF form token validated, regenerating for replay protection");
    generate_csrf_token(session).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_csrf_token_expiry() {
        let token = CsrfToken {
            value: "test".to_string(),
            created_at: chrono::Utc::now().timestamp() - 100_000,
        };
        assert!(token.is_expired());
        assert!(!CsrfToken::new().is_expired());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_token() {
        let session = session();
        let first = get_or_create_csrf_token(&session).await.unwrap();
        let second = get_or_create_csrf_token(&session).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_valid_token_is_rotated() {
        let session = session();
        let token = get_or_create_csrf_token(&session).await.unwrap();

        validate_csrf_form_field(&session, &token).await.unwrap();

        // Replaying the same token fails
        assert!(matches!(
            validate_csrf_form_field(&session, &token).await,
            Err(CsrfError::Mismatch)
        ));
    }

    #[tokio::test]
    async fn test_missing_and_short_tokens_are_rejected() {
        let session = session();
        assert!(matches!(
            validate_csrf_form_field(&session, "abc").await,
            Err(CsrfError::Missing)
        ));

        get_or_create_csrf_token(&session).await.unwrap();
        assert!(matches!(
            validate_csrf_form_field(&session, "abc").await,
            Err(CsrfError::Mismatch)
        ));
    }
}

//! Who is making the request.
//!
//! A session is either anonymous or carries an [`Identity`]. Handlers and
//! middleware go through the free functions here rather than reading the
//! session keys themselves.

use crate::models::User;
use crate::services::auth_service::{AuthService, AuthServiceError};
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const IDENTITY_KEY: &str = "identity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("login required")]
    Unauthenticated,
    #[error("admin privileges required")]
    Forbidden,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        match self {
            AccessError::Unauthenticated => Redirect::to("/login").into_response(),
            AccessError::Forbidden => Redirect::to("/home").into_response(),
        }
    }
}

/// The caller's identity, or `None` for anonymous sessions. A session that
/// cannot be read is treated as anonymous.
pub async fn current_identity(session: &Session) -> Option<Identity> {
    match session.get::<Identity>(IDENTITY_KEY).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Failed to read identity from session: {}", e);
            None
        }
    }
}

pub async fn require_authenticated(session: &Session) -> Result<Identity, AccessError> {
    current_identity(session)
        .await
        .ok_or(AccessError::Unauthenticated)
}

/// Authentication first, then the admin flag as currently stored, so a
/// revoked admin loses access without logging out.
pub async fn require_admin(
    session: &Session,
    auth_service: &AuthService,
) -> Result<Identity, AccessError> {
    let identity = require_authenticated(session).await?;

    match auth_service.get_user_by_id(identity.user_id).await {
        Ok(user) if user.is_admin => Ok(Identity::from(&user)),
        Ok(_) => Err(AccessError::Forbidden),
        Err(AuthServiceError::UserNotFound) => Err(AccessError::Unauthenticated),
        Err(e) => {
            tracing::error!("Failed to load user {} for admin check: {}", identity.user_id, e);
            Err(AccessError::Forbidden)
        }
    }
}

/// Marks the session as belonging to `user`. The session id is cycled so a
/// pre-login id cannot be reused.
pub async fn establish(
    session: &Session,
    user: &User,
) -> Result<Identity, tower_sessions::session::Error> {
    let identity = Identity::from(user);
    session.cycle_id().await?;
    session.insert(IDENTITY_KEY, &identity).await?;
    tracing::debug!("Session established for user {}", identity.user_id);
    Ok(identity)
}

pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

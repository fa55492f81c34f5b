use crate::models::user::User;
use crate::repositories::user_repository::UserRepository;
use crate::services::password::{hash_password, verify_password};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Verified against when the email is unknown, so a miss costs the same
/// Argon2 work as a wrong password.
static DUMMY_PASSWORD_HASH: Lazy<String> =
    Lazy::new(|| hash_password("keepalley-dummy-password").unwrap_or_default());

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] crate::repositories::RepositoryError),
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// Unknown email and wrong password both come back as
    /// `InvalidCredentials` so callers cannot tell them apart.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AuthServiceError> {
        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?;

        let Some(user) = user else {
            verify_password(&request.password, &DUMMY_PASSWORD_HASH);
            return Err(AuthServiceError::InvalidCredentials);
        };

        if !verify_password(&request.password, &user.password_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<User, AuthServiceError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::services::password::hash_password;
    use mockall::predicate::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: 7,
            username: "neighbor".to_string(),
            email: "neighbor@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            neighborhood: None,
            is_admin: false,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_invalid_email() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = AuthService::new(Arc::new(mock_repo));

        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };

        let result = service.authenticate(request).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
        assert!(
            Lazy::get(&DUMMY_PASSWORD_HASH).is_some(),
            "unknown email still runs a password verification"
        );
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        assert!(DUMMY_PASSWORD_HASH.starts_with("$argon2"));
        assert!(argon2::password_hash::PasswordHash::new(&DUMMY_PASSWORD_HASH).is_ok());
        assert!(!verify_password("password123", &DUMMY_PASSWORD_HASH));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut mock_repo = MockUserRepository::new();
        let user = user_with_password("password123");

        mock_repo
            .expect_find_by_email()
            .with(eq("neighbor@example.com"))
            .times(1)
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let service = AuthService::new(Arc::new(mock_repo));

        let request = LoginRequest {
            email: "neighbor@example.com".to_string(),
            password: "not-the-password".to_string(),
        };

        let result = service.authenticate(request).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_repo = MockUserRepository::new();
        let user = user_with_password("password123");

        mock_repo
            .expect_find_by_email()
            .with(eq("neighbor@example.com"))
            .times(1)
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let service = AuthService::new(Arc::new(mock_repo));

        let request = LoginRequest {
            email: " neighbor@example.com ".to_string(),
            password: "password123".to_string(),
        };

        let user = service.authenticate(request).await.expect("login to succeed");
        assert_eq!(user.id, 7);
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = AuthService::new(Arc::new(mock_repo));

        let result = service.get_user_by_id(1).await;
        assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
    }
}

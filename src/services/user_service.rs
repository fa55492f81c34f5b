use crate::models::user::User;
use crate::repositories::{
    user_repository::{NewUser, UserRepository},
    RepositoryError,
};
use crate::services::password::{hash_password, PasswordHashError};
use crate::validation::{optional, ValidationErrors};
use std::sync::Arc;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid registration: {0}")]
    Invalid(ValidationErrors),
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Hashing(#[from] PasswordHashError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: Option<String>,
    pub neighborhood: Option<String>,
}

impl RegisterRequest {
    /// Shape checks only; uniqueness is checked against the store afterwards.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.length_between(
            "username",
            &self.username,
            3,
            20,
            "Username must be between 3 and 20 characters",
        );
        errors.require_email("email", &self.email);
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }
        if let Some(ref confirm) = self.password_confirm {
            if *confirm != self.password {
                errors.add(
                    "password_confirm",
                    "Password confirmation does not match password",
                );
            }
        }

        errors.into_result()
    }
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Creates a regular account.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, UserServiceError> {
        self.create_user(request, false).await
    }

    /// Creates an account with an explicit admin flag. Only the operator CLI
    /// passes `is_admin = true`.
    pub async fn create_user(
        &self,
        request: RegisterRequest,
        is_admin: bool,
    ) -> Result<User, UserServiceError> {
        request.validate().map_err(UserServiceError::Invalid)?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        // Username before email, one error per conflicting field
        let mut conflicts = ValidationErrors::new();
        if self.repository.find_by_username(&username).await?.is_some() {
            conflicts.add("username", "Username already taken");
        }
        if self.repository.find_by_email(&email).await?.is_some() {
            conflicts.add("email", "Email already registered");
        }
        conflicts.into_result().map_err(UserServiceError::Invalid)?;

        let password_hash = hash_password(&request.password)?;

        let new_user = NewUser {
            username,
            email,
            password_hash,
            neighborhood: optional(request.neighborhood),
            is_admin,
        };

        match self.repository.create_user(&new_user).await {
            Ok(user) => {
                tracing::info!("Registered user {} (id {})", user.username, user.id);
                Ok(user)
            }
            // Lost a race with a concurrent registration
            Err(RepositoryError::AlreadyExists(column)) => {
                let errors = if column == "username" {
                    ValidationErrors::single("username", "Username already taken")
                } else {
                    ValidationErrors::single("email", "Email already registered")
                };
                Err(UserServiceError::Invalid(errors))
            }
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email.trim()).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    /// Grants or revokes admin rights. This is the only path that mutates
    /// `is_admin`.
    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<User, UserServiceError> {
        let user = self
            .repository
            .find_by_email(email.trim())
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        match self.repository.set_admin(user.id, is_admin).await {
            Ok(()) => Ok(User { is_admin, ..user }),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn update_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserServiceError::Invalid(ValidationErrors::single(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            )));
        }

        let user = self
            .repository
            .find_by_email(email.trim())
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        let password_hash = hash_password(new_password)?;

        match self
            .repository
            .update_password(user.id, &password_hash)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use mockall::predicate::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "alley_cat".to_string(),
            email: "cat@example.com".to_string(),
            password_hash: "hash".to_string(),
            neighborhood: None,
            is_admin: false,
            created_at: None,
        }
    }

    fn request() -> RegisterRequest {
        RegisterRequest {
            username: "alley_cat".to_string(),
            email: "cat@example.com".to_string(),
            password: "password123".to_string(),
            password_confirm: Some("password123".to_string()),
            neighborhood: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_username()
            .with(eq("alley_cat"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));
        mock_repo
            .expect_find_by_email()
            .with(eq("cat@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let user = sample_user();
        mock_repo
            .expect_create_user()
            .withf(|new_user: &NewUser| {
                new_user.username == "alley_cat"
                    && new_user.password_hash.starts_with("$argon2")
                    && new_user.neighborhood.is_none()
                    && !new_user.is_admin
            })
            .times(1)
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(user) })
            });

        let service = UserService::new(Arc::new(mock_repo));
        let user = service.register(request()).await.expect("Expected Ok result");
        assert_eq!(user.username, "alley_cat");
    }

    #[tokio::test]
    async fn test_register_reports_both_conflicts_username_first() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_username()
            .returning(|_| Box::pin(async move { Ok(Some(sample_user())) }));
        mock_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async move { Ok(Some(sample_user())) }));
        mock_repo.expect_create_user().times(0);

        let service = UserService::new(Arc::new(mock_repo));
        match service.register(request()).await {
            Err(UserServiceError::Invalid(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors.errors()[0].field, "username");
                assert_eq!(errors.errors()[1].field, "email");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_bad_shape_without_touching_store() {
        let mock_repo = MockUserRepository::new();
        let service = UserService::new(Arc::new(mock_repo));

        let bad = RegisterRequest {
            username: "ab".to_string(),
            email: "invalid-email".to_string(),
            password: "short".to_string(),
            password_confirm: Some("different".to_string()),
            neighborhood: None,
        };

        match service.register(bad).await {
            Err(UserServiceError::Invalid(errors)) => {
                assert!(errors.has("username"));
                assert!(errors.has("email"));
                assert!(errors.has("password"));
                assert!(errors.has("password_confirm"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_maps_unique_race_to_field_error() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_username()
            .returning(|_| Box::pin(async move { Ok(None) }));
        mock_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async move { Ok(None) }));
        mock_repo.expect_create_user().times(1).returning(|_| {
            Box::pin(async move { Err(RepositoryError::AlreadyExists("email".to_string())) })
        });

        let service = UserService::new(Arc::new(mock_repo));
        match service.register(request()).await {
            Err(UserServiceError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors.has("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_admin_unknown_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .with(eq("ghost@example.com"))
            .returning(|_| Box::pin(async move { Ok(None) }));
        mock_repo.expect_set_admin().times(0);

        let service = UserService::new(Arc::new(mock_repo));
        let result = service.set_admin("ghost@example.com", true).await;
        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }
}

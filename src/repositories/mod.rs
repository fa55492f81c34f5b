pub mod post_repository;
pub mod subscription_repository;
pub mod user_repository;

pub use post_repository::{PostRepository, SqlitePostRepository};
pub use subscription_repository::{SqliteSubscriptionRepository, SubscriptionRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate value for {0}")]
    AlreadyExists(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Maps a unique-constraint violation onto `AlreadyExists`, naming the
/// offending column when SQLite reports it (`UNIQUE constraint failed: users.email`).
pub(crate) fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    let is_unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if !is_unique {
        return RepositoryError::Database(err);
    }

    let column = err
        .as_database_error()
        .and_then(|db| db.message().rsplit('.').next().map(str::to_string))
        .unwrap_or_default();

    RepositoryError::AlreadyExists(column.trim().to_string())
}

use crate::auth::identity::Identity;
use crate::models::suggestion::{Suggestion, SuggestionCategory, SuggestionWithAuthor};
use crate::validation::ValidationErrors;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("Invalid suggestion: {0}")]
    Invalid(ValidationErrors),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default)]
pub struct CreateSuggestionRequest {
    pub title: String,
    pub description: String,
    pub category: String,
}

impl CreateSuggestionRequest {
    fn validate(&self) -> Result<SuggestionCategory, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Title is required");
        errors.require("description", &self.description, "Description is required");
        let category = self.category.parse::<SuggestionCategory>().ok();
        if category.is_none() {
            errors.add("category", "Invalid category");
        }
        errors.into_result()?;
        category.ok_or_else(|| ValidationErrors::single("category", "Invalid category"))
    }
}

#[derive(Clone, Debug)]
pub struct SuggestionService {
    pool: SqlitePool,
}

impl SuggestionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_suggestion(
        &self,
        author: &Identity,
        request: CreateSuggestionRequest,
    ) -> Result<Suggestion, SuggestionError> {
        let category = request.validate().map_err(SuggestionError::Invalid)?;

        let suggestion = sqlx::query_as::<_, Suggestion>(
            r#"
            INSERT INTO suggestions (title, description, category, user_id)
            VALUES (?, ?, ?, ?)
            RETURNING id, title, description, category, status, user_id, created_at
            "#,
        )
        .bind(request.title.trim())
        .bind(request.description.trim())
        .bind(category)
        .bind(author.user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "User {} submitted suggestion {}",
            author.username,
            suggestion.id
        );
        Ok(suggestion)
    }

    pub async fn list_suggestions(&self) -> Result<Vec<SuggestionWithAuthor>, SuggestionError> {
        let suggestions = sqlx::query_as::<_, SuggestionWithAuthor>(
            r#"
            SELECT s.id, s.title, s.description, s.category, s.status, s.user_id, s.created_at,
                   u.username AS author
            FROM suggestions s
            INNER JOIN users u ON s.user_id = u.id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suggestions)
    }
}

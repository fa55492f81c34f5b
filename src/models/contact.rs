use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A message left through the public contact form.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: Option<String>,
}

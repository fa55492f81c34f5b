use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Cleanup,
    Safety,
    Community,
    Other,
}

impl SuggestionCategory {
    pub const ALL: [SuggestionCategory; 4] = [
        SuggestionCategory::Cleanup,
        SuggestionCategory::Safety,
        SuggestionCategory::Community,
        SuggestionCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionCategory::Cleanup => "cleanup",
            SuggestionCategory::Safety => "safety",
            SuggestionCategory::Community => "community",
            SuggestionCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SuggestionCategory::Cleanup => "Cleanup",
            SuggestionCategory::Safety => "Safety",
            SuggestionCategory::Community => "Community",
            SuggestionCategory::Other => "Other",
        }
    }
}

impl FromStr for SuggestionCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuggestionCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s.trim().to_ascii_lowercase())
            .ok_or(())
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Suggestion {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: SuggestionCategory,
    pub status: String,
    pub user_id: i64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SuggestionWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub author: String,
}

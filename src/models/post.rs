use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PostCategory {
    General,
    Cleanup,
    Issue,
    Announcement,
    Update,
    Event,
    Alert,
}

impl PostCategory {
    pub const ALL: [PostCategory; 7] = [
        PostCategory::General,
        PostCategory::Cleanup,
        PostCategory::Issue,
        PostCategory::Announcement,
        PostCategory::Update,
        PostCategory::Event,
        PostCategory::Alert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostCategory::General => "general",
            PostCategory::Cleanup => "cleanup",
            PostCategory::Issue => "issue",
            PostCategory::Announcement => "announcement",
            PostCategory::Update => "update",
            PostCategory::Event => "event",
            PostCategory::Alert => "alert",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostCategory::General => "General",
            PostCategory::Cleanup => "Cleanup",
            PostCategory::Issue => "Issue",
            PostCategory::Announcement => "Announcement",
            PostCategory::Update => "Update",
            PostCategory::Event => "Event",
            PostCategory::Alert => "Alert",
        }
    }
}

impl fmt::Display for PostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PostCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s.trim().to_ascii_lowercase())
            .ok_or(())
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub user_id: i64,
    pub is_published: bool,
    pub is_featured: bool,
    pub event_date: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<String>,
}

/// A post joined with its author's username for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub author: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub user_id: i64,
    pub is_featured: bool,
    pub event_date: Option<String>,
    pub location: Option<String>,
}

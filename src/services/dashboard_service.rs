use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Clone, Debug)]
pub struct DashboardService {
    pool: SqlitePool,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub users: i64,
    pub posts: i64,
    pub suggestions: i64,
    pub contacts: i64,
    pub active_subscribers: i64,
}

impl DashboardService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Site-wide totals for the admin dashboard
    pub async fn get_stats(&self) -> Result<DashboardStats> {
        let users = self.count("SELECT COUNT(*) FROM users").await?;
        let posts = self.count("SELECT COUNT(*) FROM posts").await?;
        let suggestions = self.count("SELECT COUNT(*) FROM suggestions").await?;
        let contacts = self.count("SELECT COUNT(*) FROM contacts").await?;
        let active_subscribers = self
            .count("SELECT COUNT(*) FROM subscriptions WHERE is_active = 1")
            .await?;

        Ok(DashboardStats {
            users,
            posts,
            suggestions,
            contacts,
            active_subscribers,
        })
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await?)
    }
}

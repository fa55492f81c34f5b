use super::{map_unique_violation, RepositoryError, RepositoryResult};
use crate::models::subscription::{NewSubscription, Subscription};
use async_trait::async_trait;
use sqlx::SqlitePool;

const SUBSCRIPTION_COLUMNS: &str =
    "id, email, user_id, neighborhood, is_active, preferences, subscribed_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts an active row. A duplicate address yields `AlreadyExists`.
    async fn create(&self, subscription: &NewSubscription) -> RepositoryResult<Subscription>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Subscription>>;
    async fn set_active(&self, id: i64, is_active: bool) -> RepositoryResult<()>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    /// Addresses of every active subscriber, in subscription order.
    async fn active_emails(&self) -> RepositoryResult<Vec<String>>;
    async fn list_all(&self) -> RepositoryResult<Vec<Subscription>>;
    async fn count_active(&self) -> RepositoryResult<i64>;
}

pub struct SqliteSubscriptionRepository {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn create(&self, subscription: &NewSubscription) -> RepositoryResult<Subscription> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (email, user_id, neighborhood, preferences, is_active)
            VALUES (?, ?, ?, ?, 1)
            "#,
        )
        .bind(&subscription.email)
        .bind(subscription.user_id)
        .bind(&subscription.neighborhood)
        .bind(&subscription.preferences)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        let id = result.last_insert_rowid();
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn set_active(&self, id: i64, is_active: bool) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE subscriptions SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn active_emails(&self) -> RepositoryResult<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT email FROM subscriptions WHERE is_active = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(emails)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY subscribed_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn count_active(&self) -> RepositoryResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

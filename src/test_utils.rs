pub mod test_helpers {
    use crate::models::{Contact, Post};
    use crate::services::email_service::{
        addressable_recipients, EmailError, EmailService, Newsletter,
    };
    use crate::AppState;
    use async_trait::async_trait;
    use axum::Router;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<i64, sqlx::Error> {
        let password_hash = crate::services::password::hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, is_admin) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a subscription row directly, bypassing the welcome email
    pub async fn insert_test_subscription(
        pool: &SqlitePool,
        email: &str,
        is_active: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO subscriptions (email, is_active) VALUES (?, ?)")
            .bind(email)
            .bind(is_active)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedBroadcast {
        pub recipients: Vec<String>,
        pub post_id: i64,
        pub post_title: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedNewsletter {
        pub to: String,
        pub personal_note: Option<String>,
        pub post_titles: Vec<String>,
    }

    /// Email service that records every delivery attempt instead of sending.
    /// When failing, attempts are still recorded and then reported as failed.
    #[derive(Default)]
    pub struct RecordingEmailService {
        failing: AtomicBool,
        failing_for: Mutex<Vec<String>>,
        welcomes: Mutex<Vec<String>>,
        broadcasts: Mutex<Vec<RecordedBroadcast>>,
        newsletters: Mutex<Vec<RecordedNewsletter>>,
        contacts: Mutex<Vec<String>>,
    }

    impl RecordingEmailService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let service = Self::default();
            service.set_failing(true);
            service
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Fails only messages to `address`.
        pub fn fail_for(&self, address: &str) {
            lock(&self.failing_for).push(address.to_string());
        }

        pub fn newsletters(&self) -> Vec<RecordedNewsletter> {
            lock(&self.newsletters).clone()
        }

        pub fn welcomes(&self) -> Vec<String> {
            lock(&self.welcomes).clone()
        }

        pub fn broadcasts(&self) -> Vec<RecordedBroadcast> {
            lock(&self.broadcasts).clone()
        }

        pub fn contacts(&self) -> Vec<String> {
            lock(&self.contacts).clone()
        }

        fn outcome(&self) -> Result<(), EmailError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(EmailError::SendFailed("simulated SMTP failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_welcome(&self, to_email: &str) -> Result<(), EmailError> {
            lock(&self.welcomes).push(to_email.to_string());
            self.outcome()
        }

        async fn send_post_broadcast(
            &self,
            recipients: &[String],
            post: &Post,
        ) -> Result<usize, EmailError> {
            lock(&self.broadcasts).push(RecordedBroadcast {
                recipients: recipients.to_vec(),
                post_id: post.id,
                post_title: post.title.clone(),
            });
            self.outcome()?;
            Ok(addressable_recipients(recipients).len())
        }

        async fn send_newsletter(
            &self,
            to_email: &str,
            newsletter: &Newsletter,
        ) -> Result<(), EmailError> {
            lock(&self.newsletters).push(RecordedNewsletter {
                to: to_email.to_string(),
                personal_note: newsletter.personal_note.clone(),
                post_titles: newsletter
                    .posts
                    .iter()
                    .map(|entry| entry.post.title.clone())
                    .collect(),
            });
            if lock(&self.failing_for).iter().any(|a| a == to_email) {
                return Err(EmailError::SendFailed(format!("simulated failure for {}", to_email)));
            }
            self.outcome()
        }

        async fn send_contact_notification(&self, contact: &Contact) -> Result<(), EmailError> {
            lock(&self.contacts).push(contact.email.clone());
            self.outcome()
        }
    }

    /// Application state over `pool` with mail captured by `email`.
    pub fn create_test_state(pool: SqlitePool, email: Arc<RecordingEmailService>) -> AppState {
        AppState::build(pool, email)
    }

    /// Full router with an in-memory session store.
    pub fn create_test_app(state: AppState) -> Router {
        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
        crate::routes::build_router(state).layer(session_layer)
    }
}

// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}

#[cfg(test)]
pub async fn create_test_user(
    pool: &sqlx::SqlitePool,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, sqlx::Error> {
    test_helpers::insert_test_user(pool, username, email, password, false).await
}

use super::{RepositoryError, RepositoryResult};
use crate::models::post::{NewPost, Post, PostWithAuthor};
use async_trait::async_trait;
use sqlx::SqlitePool;

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.category, p.user_id, p.is_published, \
     p.is_featured, p.event_date, p.location, p.created_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &NewPost) -> RepositoryResult<Post>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Post>>;
    /// All posts, newest first, with their author's username.
    async fn list_posts(&self) -> RepositoryResult<Vec<PostWithAuthor>>;
    async fn list_featured(&self, limit: i64) -> RepositoryResult<Vec<PostWithAuthor>>;
    async fn posts_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Post>>;
}

pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create_post(&self, post: &NewPost) -> RepositoryResult<Post> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, category, user_id, is_featured, event_date, location)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.category)
        .bind(post.user_id)
        .bind(post.is_featured)
        .bind(&post.event_date)
        .bind(&post.location)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_posts(&self) -> RepositoryResult<Vec<PostWithAuthor>> {
        let posts = sqlx::query_as::<_, PostWithAuthor>(&format!(
            r#"
            SELECT {POST_COLUMNS}, u.username AS author
            FROM posts p
            INNER JOIN users u ON p.user_id = u.id
            ORDER BY p.created_at DESC, p.id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_featured(&self, limit: i64) -> RepositoryResult<Vec<PostWithAuthor>> {
        let posts = sqlx::query_as::<_, PostWithAuthor>(&format!(
            r#"
            SELECT {POST_COLUMNS}, u.username AS author
            FROM posts p
            INNER JOIN users u ON p.user_id = u.id
            WHERE p.is_featured = 1 AND p.is_published = 1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn posts_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.user_id = ? ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}

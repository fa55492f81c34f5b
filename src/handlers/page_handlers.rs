use super::PageContext;
use crate::auth::identity::Identity;
use crate::error::AppError;
use crate::models::{Post, PostWithAuthor, User};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use tower_sessions::Session;

const HOME_POST_LIMIT: usize = 5;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
struct IndexTemplate {
    page: PageContext,
    featured: Vec<PostWithAuthor>,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
struct HomeTemplate {
    page: PageContext,
    posts: Vec<PostWithAuthor>,
}

#[derive(Template, WebTemplate)]
#[template(path = "community.html")]
struct CommunityTemplate {
    page: PageContext,
    posts: Vec<PostWithAuthor>,
}

#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    page: PageContext,
    user: User,
    posts: Vec<Post>,
}

/// GET / - landing page with featured posts
pub async fn landing_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let featured = state.post_service.featured_posts().await?;
    Ok(IndexTemplate {
        page: PageContext::load(&session).await?,
        featured,
    })
}

/// GET /home - the most recent posts
pub async fn home_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let mut posts = state.post_service.list_posts().await?;
    posts.truncate(HOME_POST_LIMIT);
    Ok(HomeTemplate {
        page: PageContext::load(&session).await?,
        posts,
    })
}

/// GET /community - every post, newest first
pub async fn community_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let posts = state.post_service.list_posts().await?;
    Ok(CommunityTemplate {
        page: PageContext::load(&session).await?,
        posts,
    })
}

/// GET /profile - the caller's account and own posts
pub async fn profile_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.get_user_by_id(identity.user_id).await?;
    let posts = state.post_service.posts_by_user(user.id).await?;
    Ok(ProfileTemplate {
        page: PageContext::load(&session).await?,
        user,
        posts,
    })
}

/// GET /health - liveness check
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database query failed: {}", e);
            "unavailable"
        }
    };

    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database == "ok" { "ok" } else { "degraded" },
            "database": database,
            "environment": crate::config::current_environment(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

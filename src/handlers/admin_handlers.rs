use super::post_handlers::{created_message, PostForm};
use super::PageContext;
use crate::auth::identity::Identity;
use crate::error::AppError;
use crate::flash;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::models::{PostCategory, PostWithAuthor};
use crate::services::{DashboardStats, PostServiceError};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tower_sessions::Session;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    page: PageContext,
    stats: DashboardStats,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/posts.html")]
struct AdminPostsTemplate {
    page: PageContext,
    posts: Vec<PostWithAuthor>,
    errors: Vec<String>,
    form: PostForm,
    categories: &'static [PostCategory],
}

/// GET /admin/dashboard - site-wide counts
pub async fn admin_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.dashboard_service.get_stats().await?;
    Ok(DashboardTemplate {
        page: PageContext::load(&session).await?,
        stats,
    })
}

async fn render_posts(
    state: &AppState,
    session: &Session,
    form: PostForm,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    let posts = state.post_service.list_posts().await?;
    Ok(AdminPostsTemplate {
        page: PageContext::load(session).await?,
        posts,
        errors,
        form,
        categories: &PostCategory::ALL,
    }
    .into_response())
}

/// GET /admin/posts
pub async fn admin_posts_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    render_posts(&state, &session, PostForm::default(), Vec::new()).await
}

/// POST /admin/posts - admin post with featured flag, event date and location
pub async fn admin_create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    session: Session,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    match state.post_service.create_post(&identity, form.to_request()).await {
        Ok(published) => {
            flash::success(&session, created_message(published.broadcast)).await;
            Ok(Redirect::to("/admin/posts").into_response())
        }
        Err(PostServiceError::Invalid(errors)) => {
            render_posts(&state, &session, form, errors.messages()).await
        }
        Err(e) => {
            tracing::error!("Admin post creation failed: {}", e);
            render_posts(&state, &session, form, vec!["Error creating post.".to_string()]).await
        }
    }
}

use super::PageContext;
use crate::auth::identity::Identity;
use crate::error::AppError;
use crate::flash;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::models::PostCategory;
use crate::services::{BroadcastOutcome, CreatePostRequest, PostServiceError};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Template, WebTemplate)]
#[template(path = "submit.html")]
struct SubmitTemplate {
    page: PageContext,
    errors: Vec<String>,
    form: PostForm,
    categories: &'static [PostCategory],
}

/// Fields shared by the member and admin post forms. The admin-only fields
/// are ignored for non-admin authors.
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub is_featured: Option<String>,
    pub event_date: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

fn default_category() -> String {
    PostCategory::General.as_str().to_string()
}

impl Default for PostForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            category: default_category(),
            is_featured: None,
            event_date: None,
            location: None,
            csrf_token: String::new(),
        }
    }
}

impl PostForm {
    pub fn to_request(&self) -> CreatePostRequest {
        CreatePostRequest {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            is_featured: self.is_featured.is_some(),
            event_date: self.event_date.clone(),
            location: self.location.clone(),
        }
    }

    pub fn event_date_value(&self) -> &str {
        self.event_date.as_deref().unwrap_or("")
    }

    pub fn location_value(&self) -> &str {
        self.location.as_deref().unwrap_or("")
    }
}

/// Flash text for a stored post. A failed broadcast still reads as success.
pub(crate) fn created_message(broadcast: Option<BroadcastOutcome>) -> String {
    match broadcast {
        Some(BroadcastOutcome::Sent(count)) => {
            format!("Post created and {} subscriber(s) notified!", count)
        }
        _ => "Post created successfully!".to_string(),
    }
}

async fn render_form(
    session: &Session,
    form: PostForm,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    Ok(SubmitTemplate {
        page: PageContext::load(session).await?,
        errors,
        form,
        categories: &PostCategory::ALL,
    }
    .into_response())
}

/// GET /submit
pub async fn submit_page(session: Session) -> Result<Response, AppError> {
    render_form(&session, PostForm::default(), Vec::new()).await
}

/// POST /submit - create a post and notify subscribers
pub async fn submit_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    session: Session,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    match state.post_service.create_post(&identity, form.to_request()).await {
        Ok(published) => {
            flash::success(&session, created_message(published.broadcast)).await;
            Ok(Redirect::to("/community").into_response())
        }
        Err(PostServiceError::Invalid(errors)) => {
            render_form(&session, form, errors.messages()).await
        }
        Err(e) => {
            tracing::error!("Failed to create post for user {}: {}", identity.user_id, e);
            render_form(&session, form, vec!["Failed to create post".to_string()]).await
        }
    }
}

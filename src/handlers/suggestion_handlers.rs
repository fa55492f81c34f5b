use super::PageContext;
use crate::auth::identity::Identity;
use crate::error::AppError;
use crate::flash;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::models::{SuggestionCategory, SuggestionWithAuthor};
use crate::services::{CreateSuggestionRequest, SuggestionError};
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
#[template(path = "suggestions.html")]
struct SuggestionsTemplate {
    page: PageContext,
    suggestions: Vec<SuggestionWithAuthor>,
}

#[derive(Template, WebTemplate)]
#[template(path = "submit_suggestion.html")]
struct SubmitSuggestionTemplate {
    page: PageContext,
    errors: Vec<String>,
    form: SuggestionForm,
    categories: &'static [SuggestionCategory],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub csrf_token: String,
}

async fn render_form(
    session: &Session,
    form: SuggestionForm,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    Ok(SubmitSuggestionTemplate {
        page: PageContext::load(session).await?,
        errors,
        form,
        categories: &SuggestionCategory::ALL,
    }
    .into_response())
}

/// GET /suggestions
pub async fn suggestions_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let suggestions = state.suggestion_service.list_suggestions().await?;
    Ok(SuggestionsTemplate {
        page: PageContext::load(&session).await?,
        suggestions,
    })
}

/// GET /submit_suggestion
pub async fn submit_suggestion_page(session: Session) -> Result<Response, AppError> {
    render_form(&session, SuggestionForm::default(), Vec::new()).await
}

/// POST /submit_suggestion
pub async fn submit_suggestion(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    session: Session,
    Form(form): Form<SuggestionForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    let request = CreateSuggestionRequest {
        title: form.title.clone(),
        description: form.description.clone(),
        category: form.category.clone(),
    };

    match state
        .suggestion_service
        .create_suggestion(&identity, request)
        .await
    {
        Ok(_) => {
            flash::success(&session, "Thank you for your suggestion!").await;
            Ok(Redirect::to("/suggestions").into_response())
        }
        Err(SuggestionError::Invalid(errors)) => {
            render_form(&session, form, errors.messages()).await
        }
        Err(e) => {
            tracing::error!("Failed to store suggestion: {}", e);
            render_form(&session, form, vec!["Failed to submit suggestion".to_string()]).await
        }
    }
}

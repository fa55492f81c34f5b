use super::PageContext;
use crate::auth::identity::current_identity;
use crate::error::AppError;
use crate::flash;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::services::{SubscribeOutcome, SubscribeRequest, SubscriptionError};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Template, WebTemplate)]
#[template(path = "subscribe.html")]
struct SubscribeTemplate {
    page: PageContext,
    errors: Vec<String>,
    form: SubscribeForm,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

async fn render_form(
    session: &Session,
    form: SubscribeForm,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    Ok(SubscribeTemplate {
        page: PageContext::load(session).await?,
        errors,
        form,
    }
    .into_response())
}

/// GET /subscribe
pub async fn subscribe_page(session: Session) -> Result<Response, AppError> {
    render_form(&session, SubscribeForm::default(), Vec::new()).await
}

/// POST /subscribe - create or reactivate a subscription
pub async fn subscribe_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SubscribeForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    let request = SubscribeRequest {
        email: form.email.clone(),
        user_id: current_identity(&session).await.map(|i| i.user_id),
        neighborhood: form.neighborhood.clone(),
        preferences: None,
    };

    match state.subscription_service.subscribe(request).await {
        Ok(SubscribeOutcome::Created) => {
            flash::success(
                &session,
                "Thank you for subscribing! You will receive updates about alley collection services.",
            )
            .await;
        }
        Ok(SubscribeOutcome::Reactivated) => {
            flash::success(&session, "Welcome back! Your subscription has been reactivated.").await;
        }
        Ok(SubscribeOutcome::AlreadySubscribed) => {
            flash::info(&session, "You are already subscribed!").await;
        }
        Err(SubscriptionError::Invalid(errors)) => {
            return render_form(&session, form, errors.messages()).await;
        }
        Err(e) => {
            tracing::error!("Subscription for {} failed: {}", form.email.trim(), e);
            flash::error(&session, "An error occurred. Please try again.").await;
        }
    }

    Ok(Redirect::to("/home").into_response())
}

/// GET /unsubscribe/{email}
pub async fn unsubscribe_handler(
    State(state): State<AppState>,
    session: Session,
    Path(email): Path<String>,
) -> Result<Response, AppError> {
    match state.subscription_service.unsubscribe(&email).await {
        Ok(()) => flash::info(&session, "You have been unsubscribed from our updates.").await,
        Err(SubscriptionError::NotFound) => {
            flash::error(&session, "Subscription not found.").await
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/home").into_response())
}

use super::PageContext;
use crate::error::AppError;
use crate::flash;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::services::{ContactError, ContactRequest};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
struct ContactTemplate {
    page: PageContext,
    errors: Vec<String>,
    form: ContactForm,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub csrf_token: String,
}

async fn render_form(
    session: &Session,
    form: ContactForm,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    Ok(ContactTemplate {
        page: PageContext::load(session).await?,
        errors,
        form,
    }
    .into_response())
}

pub async fn show_contact_form(session: Session) -> Result<Response, AppError> {
    render_form(&session, ContactForm::default(), Vec::new()).await
}

pub async fn submit_contact_form(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    let request = ContactRequest {
        name: form.name.clone(),
        email: form.email.clone(),
        subject: form.subject.clone(),
        message: form.message.clone(),
    };

    match state.contact_service.submit(request).await {
        Ok(_) => {
            flash::success(
                &session,
                "Thank you for your message! We'll get back to you soon.",
            )
            .await;
            Ok(Redirect::to("/contact").into_response())
        }
        Err(ContactError::Invalid(errors)) => render_form(&session, form, errors.messages()).await,
        Err(e) => {
            tracing::error!("Contact form submission failed: {}", e);
            render_form(
                &session,
                form,
                vec!["Failed to send message. Please try again.".to_string()],
            )
            .await
        }
    }
}

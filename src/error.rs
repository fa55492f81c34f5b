use crate::handlers::PageContext;
use crate::middleware::csrf::CsrfError;
use crate::repositories::RepositoryError;
use crate::services::{
    auth_service::AuthServiceError, user_service::UserServiceError, ContactError,
    NewsletterError, PostServiceError, SubscriptionError, SuggestionError,
};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures that reach the HTTP boundary. Users only ever see a generic
/// message; the detail goes to the log.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Csrf(#[from] CsrfError),

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

macro_rules! internal_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(err: $source) -> Self {
                    AppError::Internal(anyhow::Error::new(err))
                }
            }
        )*
    };
}

internal_from!(
    AuthServiceError,
    UserServiceError,
    PostServiceError,
    SubscriptionError,
    SuggestionError,
    ContactError,
    NewsletterError,
);

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    page: PageContext,
    status: u16,
    message: String,
}

pub fn render_error_page(status: StatusCode, message: &str) -> Response {
    let template = ErrorTemplate {
        page: PageContext::default(),
        status: status.as_u16(),
        message: message.to_string(),
    };
    let body = template
        .render()
        .unwrap_or_else(|_| format!("<html><body><h1>{}</h1></body></html>", status));
    (status, Html(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                render_error_page(StatusCode::NOT_FOUND, "The page you requested was not found.")
            }
            AppError::Csrf(e) => {
                tracing::warn!("Rejected form submission: {}", e);
                e.into_response()
            }
            other => {
                tracing::error!("Request failed: {}", other);
                render_error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.",
                )
            }
        }
    }
}

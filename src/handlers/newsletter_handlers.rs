use super::PageContext;
use crate::error::AppError;
use crate::flash;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::models::Subscription;
use crate::services::email_service::NEWSLETTER_SUBJECT;
use crate::services::NewsletterReport;
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Bytes,
    extract::{FromRequest, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{de::DeserializeOwned, Deserialize};
use tower_sessions::Session;

/// Form extractor that understands indexed fields such as
/// `subscribers[0]=a@example.com`, which the plain `Form` cannot collect
/// into a `Vec`.
pub struct QsForm<T>(pub T);

impl<T, S> FromRequest<S> for QsForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read body: {}", e),
            )
        })?;

        let body = std::str::from_utf8(&bytes)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid UTF-8: {}", e)))?;

        // Non-strict so percent-encoded brackets from browsers are accepted
        let config = serde_qs::Config::new(5, false);
        let value = config.deserialize_str(body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to parse form: {}", e),
            )
        })?;

        Ok(QsForm(value))
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/newsletter.html")]
struct NewsletterTemplate {
    page: PageContext,
    subscribers: Vec<Subscription>,
    active_count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/newsletter_preview.html")]
struct NewsletterPreviewTemplate {
    page: PageContext,
    subject: &'static str,
    body: String,
    personal_note: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub personal_note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsletterForm {
    #[serde(default)]
    pub personal_note: String,
    /// Checked subscriber emails; none checked means everyone active.
    #[serde(default)]
    pub subscribers: Vec<String>,
    #[serde(default)]
    pub csrf_token: String,
}

pub(crate) fn report_message(report: &NewsletterReport) -> String {
    if report.total == 0 {
        "No active subscribers to send to.".to_string()
    } else if report.failed == 0 {
        format!("Newsletter sent to {} subscriber(s).", report.sent)
    } else {
        format!(
            "Newsletter sent to {} of {} subscriber(s); {} failed.",
            report.sent, report.total, report.failed
        )
    }
}

/// GET /admin/newsletter - subscriber list and send form
pub async fn newsletter_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let subscribers = state.subscription_service.list_subscriptions().await?;
    let active_count = subscribers.iter().filter(|s| s.is_active).count();
    Ok(NewsletterTemplate {
        page: PageContext::load(&session).await?,
        subscribers,
        active_count,
    })
}

/// GET /admin/newsletter/preview - the shared part of this edition
pub async fn newsletter_preview(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PreviewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let newsletter = state
        .newsletter_service
        .compose(query.personal_note.clone())
        .await?;
    Ok(NewsletterPreviewTemplate {
        page: PageContext::load(&session).await?,
        subject: NEWSLETTER_SUBJECT,
        body: newsletter.body(),
        personal_note: newsletter.personal_note.unwrap_or_default(),
    })
}

/// POST /admin/newsletter/send
pub async fn send_newsletter(
    State(state): State<AppState>,
    session: Session,
    QsForm(form): QsForm<NewsletterForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    match state
        .newsletter_service
        .send(Some(form.personal_note), &form.subscribers)
        .await
    {
        Ok(report) => {
            let message = report_message(&report);
            if report.failed > 0 {
                flash::error(&session, message).await;
            } else if report.total == 0 {
                flash::info(&session, message).await;
            } else {
                flash::success(&session, message).await;
            }
        }
        Err(e) => {
            tracing::error!("Newsletter run failed: {}", e);
            flash::error(&session, "Failed to send newsletter.").await;
        }
    }

    Ok(Redirect::to("/admin/newsletter").into_response())
}

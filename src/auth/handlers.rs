use crate::auth::identity;
use crate::error::AppError;
use crate::flash;
use crate::handlers::PageContext;
use crate::middleware::csrf::validate_csrf_form_field;
use crate::services::{
    auth_service::{AuthServiceError, LoginRequest},
    user_service::{RegisterRequest, UserServiceError},
    SubscribeOutcome, SubscribeRequest,
};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

const INVALID_TOKEN: &str = "Invalid security token. Please refresh the page and try again.";

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    page: PageContext,
    errors: Vec<String>,
    form: RegisterForm,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    page: PageContext,
    error: Option<String>,
    email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    pub neighborhood: Option<String>,
    /// "subscribe me" checkbox
    pub subscribe: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

impl RegisterForm {
    pub fn neighborhood_value(&self) -> &str {
        self.neighborhood.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    csrf_token: String,
}

async fn register_form(
    session: &Session,
    mut form: RegisterForm,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    // Never echo passwords back into the page
    form.password.clear();
    form.password_confirm.clear();

    Ok(RegisterTemplate {
        page: PageContext::load(session).await?,
        errors,
        form,
    }
    .into_response())
}

async fn login_form(
    session: &Session,
    email: String,
    error: Option<&str>,
) -> Result<Response, AppError> {
    Ok(LoginTemplate {
        page: PageContext::load(session).await?,
        error: error.map(str::to_string),
        email,
    }
    .into_response())
}

pub async fn register_page(session: Session) -> Result<Response, AppError> {
    register_form(&session, RegisterForm::default(), Vec::new()).await
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return register_form(&session, form, vec![INVALID_TOKEN.to_string()]).await;
    }

    let request = RegisterRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        password_confirm: Some(form.password_confirm.clone()),
        neighborhood: form.neighborhood.clone(),
    };

    let user = match app_state.user_service.register(request).await {
        Ok(user) => user,
        Err(UserServiceError::Invalid(errors)) => {
            return register_form(&session, form, errors.messages()).await;
        }
        Err(e) => {
            tracing::error!("Registration failed: {}", e);
            return register_form(
                &session,
                form,
                vec!["Registration failed. Please try again.".to_string()],
            )
            .await;
        }
    };

    identity::establish(&session, &user).await?;

    if form.subscribe.is_some() {
        // Best-effort; registration already succeeded
        let request = SubscribeRequest {
            email: user.email.clone(),
            user_id: Some(user.id),
            neighborhood: user.neighborhood.clone(),
            preferences: None,
        };
        match app_state.subscription_service.subscribe(request).await {
            Ok(SubscribeOutcome::Created | SubscribeOutcome::Reactivated) => {
                flash::info(&session, "You are now subscribed to updates.").await;
            }
            Ok(SubscribeOutcome::AlreadySubscribed) => {}
            Err(e) => {
                tracing::warn!("Subscription during registration of {} failed: {}", user.id, e);
            }
        }
    }

    flash::success(&session, "Registration successful! Welcome to Keep Alley Trash.").await;
    Ok(Redirect::to("/home").into_response())
}

pub async fn login_page(session: Session) -> Result<Response, AppError> {
    login_form(&session, String::new(), None).await
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return login_form(&session, form.email, Some(INVALID_TOKEN)).await;
    }

    let request = LoginRequest {
        email: form.email.clone(),
        password: form.password,
    };

    match app_state.auth_service.authenticate(request).await {
        Ok(user) => {
            identity::establish(&session, &user).await?;
            tracing::info!("User {} logged in", user.id);
            flash::success(&session, format!("Welcome back, {}!", user.username)).await;
            Ok(Redirect::to("/home").into_response())
        }
        Err(AuthServiceError::InvalidCredentials) => {
            login_form(&session, form.email, Some("Invalid email or password")).await
        }
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            login_form(
                &session,
                form.email,
                Some("An error occurred. Please try again."),
            )
            .await
        }
    }
}

pub async fn logout_handler(session: Session) -> Result<Response, AppError> {
    identity::clear(&session).await?;
    Ok(Redirect::to("/").into_response())
}

use crate::auth::identity::{require_admin as check_admin, require_authenticated, AccessError};
use crate::flash;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Lets authenticated callers through with their `Identity` attached as a
/// request extension; everyone else is sent to the login page.
pub async fn require_auth(session: Session, mut request: Request, next: Next) -> Response {
    match require_authenticated(&session).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(denied) => {
            flash::info(&session, "Please log in to access this page.").await;
            denied.into_response()
        }
    }
}

pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match check_admin(&session, &state.auth_service).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(AccessError::Unauthenticated) => {
            flash::info(&session, "Please log in to access this page.").await;
            AccessError::Unauthenticated.into_response()
        }
        Err(AccessError::Forbidden) => {
            tracing::warn!(
                "Non-admin request to {} {} denied",
                request.method(),
                request.uri().path()
            );
            flash::error(&session, "Access denied.").await;
            AccessError::Forbidden.into_response()
        }
    }
}

pub async fn redirect_if_authenticated(session: Session, request: Request, next: Next) -> Response {
    if require_authenticated(&session).await.is_ok() {
        // Already logged in; the form is not processed
        Redirect::to("/home").into_response()
    } else {
        next.run(request).await
    }
}

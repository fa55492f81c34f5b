use crate::{auth, handlers, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Every application route. The caller supplies the session layer, which
/// must wrap the whole router.
pub fn build_router(state: AppState) -> Router {
    let guest_routes = Router::new()
        .route(
            "/register",
            get(auth::handlers::register_page).post(auth::handlers::register_handler),
        )
        .route(
            "/login",
            get(auth::handlers::login_page).post(auth::handlers::login_handler),
        )
        .layer(middleware::from_fn(auth::middleware::redirect_if_authenticated));

    let protected_routes = Router::new()
        .route("/logout", get(auth::handlers::logout_handler))
        .route(
            "/submit",
            get(handlers::submit_page).post(handlers::submit_post),
        )
        .route(
            "/submit_suggestion",
            get(handlers::submit_suggestion_page).post(handlers::submit_suggestion),
        )
        .route("/profile", get(handlers::profile_page))
        .layer(middleware::from_fn(auth::middleware::require_auth));

    let admin_routes = Router::new()
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .route(
            "/admin/posts",
            get(handlers::admin_posts_page).post(handlers::admin_create_post),
        )
        .route("/admin/newsletter", get(handlers::newsletter_page))
        .route("/admin/newsletter/preview", get(handlers::newsletter_preview))
        .route("/admin/newsletter/send", post(handlers::send_newsletter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_admin,
        ));

    Router::new()
        .route("/", get(handlers::landing_page))
        .route("/home", get(handlers::home_page))
        .route("/community", get(handlers::community_page))
        .route(
            "/subscribe",
            get(handlers::subscribe_page).post(handlers::subscribe_handler),
        )
        .route("/unsubscribe/{email}", get(handlers::unsubscribe_handler))
        .route("/suggestions", get(handlers::suggestions_page))
        .route(
            "/contact",
            get(handlers::show_contact_form).post(handlers::submit_contact_form),
        )
        .route("/health", get(handlers::health_handler))
        .merge(guest_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .fallback(handlers::not_found)
        .with_state(state)
}

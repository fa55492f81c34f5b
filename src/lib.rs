pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use repositories::{
    PostRepository, SqlitePostRepository, SqliteSubscriptionRepository, SqliteUserRepository,
    SubscriptionRepository, UserRepository,
};
use services::{
    auth_service::AuthService, contact_service::ContactService,
    dashboard_service::DashboardService, email_service::EmailService,
    newsletter_service::NewsletterService, notification::NotificationDispatcher,
    post_service::PostService, subscription_service::SubscriptionService,
    suggestion_service::SuggestionService, user_service::UserService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub post_service: Arc<PostService>,
    pub suggestion_service: Arc<SuggestionService>,
    pub contact_service: Arc<ContactService>,
    pub dashboard_service: Arc<DashboardService>,
    pub newsletter_service: Arc<NewsletterService>,
    pub pool: sqlx::SqlitePool,
}

impl AppState {
    /// Wires repositories and services over one pool and one mail transport.
    pub fn build(pool: sqlx::SqlitePool, email_service: Arc<dyn EmailService>) -> Self {
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(pool.clone()));
        let post_repository: Arc<dyn PostRepository> =
            Arc::new(SqlitePostRepository::new(pool.clone()));
        let subscription_repository: Arc<dyn SubscriptionRepository> =
            Arc::new(SqliteSubscriptionRepository::new(pool.clone()));

        let notifier = Arc::new(NotificationDispatcher::new(
            email_service,
            subscription_repository.clone(),
        ));

        Self {
            user_service: Arc::new(UserService::new(user_repository.clone())),
            auth_service: Arc::new(AuthService::new(user_repository)),
            subscription_service: Arc::new(SubscriptionService::new(
                subscription_repository,
                notifier.clone(),
            )),
            post_service: Arc::new(PostService::new(post_repository.clone(), notifier.clone())),
            newsletter_service: Arc::new(NewsletterService::new(post_repository, notifier.clone())),
            suggestion_service: Arc::new(SuggestionService::new(pool.clone())),
            contact_service: Arc::new(ContactService::new(pool.clone(), notifier)),
            dashboard_service: Arc::new(DashboardService::new(pool.clone())),
            pool,
        }
    }
}

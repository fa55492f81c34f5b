pub mod auth_service;
pub mod contact_service;
pub mod dashboard_service;
pub mod email_service;
pub mod newsletter_service;
pub mod notification;
pub mod password;
pub mod post_service;
pub mod subscription_service;
pub mod suggestion_service;
pub mod user_service;

pub use contact_service::{ContactError, ContactRequest, ContactService};
pub use dashboard_service::{DashboardService, DashboardStats};
pub use email_service::{
    create_email_service, EmailError, EmailService, MockEmailService, Newsletter,
};
pub use newsletter_service::{NewsletterError, NewsletterService};
pub use notification::{
    BroadcastOutcome, NewsletterReport, NotificationDispatcher, NotificationError,
};
pub use post_service::{CreatePostRequest, PostService, PostServiceError, PublishedPost};
pub use subscription_service::{
    SubscribeOutcome, SubscribeRequest, SubscriptionError, SubscriptionService,
};
pub use suggestion_service::{CreateSuggestionRequest, SuggestionError, SuggestionService};

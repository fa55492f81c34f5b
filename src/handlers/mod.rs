pub mod admin_handlers;
pub mod contact_handlers;
pub mod newsletter_handlers;
pub mod page_handlers;
pub mod post_handlers;
pub mod subscription_handlers;
pub mod suggestion_handlers;

pub use admin_handlers::{admin_create_post, admin_dashboard, admin_posts_page};
pub use contact_handlers::{show_contact_form, submit_contact_form};
pub use newsletter_handlers::{newsletter_page, newsletter_preview, send_newsletter};
pub use page_handlers::{community_page, health_handler, home_page, landing_page, not_found, profile_page};
pub use post_handlers::{submit_page, submit_post};
pub use subscription_handlers::{subscribe_handler, subscribe_page, unsubscribe_handler};
pub use suggestion_handlers::{submit_suggestion, submit_suggestion_page, suggestions_page};

use crate::auth::identity::{current_identity, Identity};
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::middleware::csrf::get_or_create_csrf_token;
use tower_sessions::Session;

/// What every rendered page needs: who is asking, pending flash messages
/// and the form token.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub identity: Option<Identity>,
    pub flashes: Vec<Flash>,
    pub csrf_token: String,
}

impl PageContext {
    pub async fn load(session: &Session) -> Result<Self, AppError> {
        let csrf_token = get_or_create_csrf_token(session).await?;
        Ok(Self {
            identity: current_identity(session).await,
            flashes: flash::take(session).await,
            csrf_token,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().map(|i| i.is_admin).unwrap_or(false)
    }

    pub fn username(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.username.as_str())
            .unwrap_or("")
    }
}

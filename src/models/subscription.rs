use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An address enrolled in the update mailing list.
///
/// Rows are never deleted: unsubscribing flips `is_active` and a later
/// subscribe for the same address reactivates the row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub email: String,
    pub user_id: Option<i64>,
    pub neighborhood: Option<String>,
    pub is_active: bool,
    pub preferences: Option<String>,
    pub subscribed_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSubscription {
    pub email: String,
    pub user_id: Option<i64>,
    pub neighborhood: Option<String>,
    pub preferences: Option<String>,
}

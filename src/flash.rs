//! One-shot messages carried in the session across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "alert-success",
            FlashLevel::Info => "alert-info",
            FlashLevel::Error => "alert-danger",
        }
    }
}

pub async fn push(session: &Session, level: FlashLevel, message: impl Into<String>) {
    let mut pending: Vec<Flash> = session.get(FLASH_KEY).await.ok().flatten().unwrap_or_default();
    pending.push(Flash {
        level,
        message: message.into(),
    });
    if let Err(e) = session.insert(FLASH_KEY, pending).await {
        tracing::warn!("Failed to store flash message: {}", e);
    }
}

pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, FlashLevel::Success, message).await
}

pub async fn info(session: &Session, message: impl Into<String>) {
    push(session, FlashLevel::Info, message).await
}

pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, FlashLevel::Error, message).await
}

/// Removes and returns every pending message.
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(FLASH_KEY).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read flash messages: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_messages_are_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        success(&session, "Saved").await;
        error(&session, "But something else failed").await;

        let taken = take(&session).await;
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].css_class(), "alert-success");
        assert_eq!(taken[1].level, FlashLevel::Error);

        assert!(take(&session).await.is_empty());
    }
}

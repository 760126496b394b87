use crate::types::{CreateMessageRequest, StoredMessage};
use anyhow::Result;
use futures::future::BoxFuture;
use serde::Serialize;

/// Persistence for chat messages and executor resumption ids.
pub trait ChatStore: Send + Sync {
    fn create_message(&self, request: CreateMessageRequest)
        -> BoxFuture<'_, Result<StoredMessage>>;

    fn set_session_id<'a>(
        &'a self,
        chat_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Error surfaced to the user; successes are only logged.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// User-facing feedback channel (toasts in a desktop shell).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

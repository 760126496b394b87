use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A message already stored for a chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    /// JSON array of tool call objects.
    #[serde(default)]
    pub tool_calls: Option<String>,
    /// JSON array of tool result objects.
    #[serde(default)]
    pub tool_results: Option<String>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub tokens_used: Option<i32>,
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Number of assistant turns already persisted for a chat.
pub fn count_assistant_messages(messages: &[StoredMessage]) -> usize {
    messages
        .iter()
        .filter(|message| message.role == MessageRole::Assistant)
        .count()
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One line of executor `stream-json` output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    System {
        #[serde(default, deserialize_with = "lenient")]
        subtype: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        session_id: Option<String>,
    },
    Assistant {
        #[serde(default)]
        message: EventMessage,
    },
    /// Tool feedback re-injected into the conversation, not end-user input.
    User {
        #[serde(default)]
        message: EventMessage,
    },
    Result {
        #[serde(default, deserialize_with = "lenient")]
        subtype: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        is_error: Option<bool>,
        #[serde(default, deserialize_with = "lenient")]
        result: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        session_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Message body of `assistant` and `user` events.
///
/// Blocks are decoded one by one: a malformed block becomes
/// [`ContentBlock::Unknown`] and its siblings are kept. Plain string content
/// is read as a single text block.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EventMessage {
    pub content: Vec<ContentBlock>,
}

impl<'de> Deserialize<'de> for EventMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let content = match Value::deserialize(deserializer)? {
            Value::Object(mut map) => map
                .remove("content")
                .map(content_blocks)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(Self { content })
    }
}

fn content_blocks(content: Value) -> Vec<ContentBlock> {
    match content {
        Value::Array(blocks) => blocks
            .into_iter()
            .map(|block| {
                ContentBlock::deserialize(block).unwrap_or_else(|error| {
                    tracing::debug!(%error, "skipping malformed content block");
                    ContentBlock::Unknown
                })
            })
            .collect(),
        Value::String(text) => vec![ContentBlock::Text { text: Some(text) }],
        _ => Vec::new(),
    }
}

/// Optional field that reads as `None` when its JSON has the wrong type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default, deserialize_with = "lenient")]
        text: Option<String>,
    },
    ToolUse {
        #[serde(default, deserialize_with = "lenient")]
        id: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        name: Option<String>,
        #[serde(default)]
        input: Option<Value>,
    },
    ToolResult {
        #[serde(default, alias = "toolUseId", deserialize_with = "lenient")]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default, alias = "isError", deserialize_with = "lenient")]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unknown,
}

impl Event {
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self::Assistant {
            message: EventMessage { content },
        }
    }

    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self::User {
            message: EventMessage { content },
        }
    }

    pub fn result(subtype: &str) -> Self {
        Self::Result {
            subtype: Some(subtype.to_string()),
            is_error: None,
            result: None,
            session_id: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant { .. })
    }

    pub fn is_result(&self) -> bool {
        matches!(self, Self::Result { .. })
    }

    /// Resumption id carried by `system` and `result` events.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::System { session_id, .. } | Self::Result { session_id, .. } => {
                session_id.as_deref().filter(|id| !id.is_empty())
            }
            _ => None,
        }
    }
}

impl ContentBlock {
    pub fn text(text: &str) -> Self {
        Self::Text {
            text: Some(text.to_string()),
        }
    }

    pub fn tool_use(id: &str, name: &str, input: Value) -> Self {
        Self::ToolUse {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            input: Some(input),
        }
    }

    pub fn tool_result(tool_use_id: &str, content: &str, is_error: bool) -> Self {
        Self::ToolResult {
            tool_use_id: Some(tool_use_id.to_string()),
            content: Some(Value::String(content.to_string())),
            is_error: Some(is_error),
        }
    }
}

/// Flattens a tool result payload into display text.
///
/// Strings pass through, arrays of `{type: text}` parts are joined with
/// newlines, and anything else is rendered as its JSON text.
pub fn tool_result_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(map) => map.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

/// Tool input as a JSON object, `{}` when absent or not an object.
pub fn tool_input_object(input: Option<&Value>) -> Value {
    match input {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(serde_json::Map::new()),
    }
}

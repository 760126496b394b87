use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayItem {
    /// One assistant text block.
    Text { content: String },
    /// Tool invocation, paired with its result once one arrives.
    Tool { tool: ToolDisplay },
    /// Turn-end marker.
    Result { subtype: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDisplay {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolDisplay {
    /// No result has been paired with this invocation yet.
    pub fn is_running(&self) -> bool {
        self.output.is_none()
    }
}

use super::turn::filter_to_current_turn;
use crate::types::{
    tool_input_object, tool_result_text, ContentBlock, CreateMessageRequest, Event, MessageRole,
};
use anyhow::{Context, Result};
use serde::Serialize;

const TEXT_PART_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

/// Flattened transcript of one turn, ready to persist.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
}

impl ExtractedContent {
    /// Nothing worth storing happened this turn.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tool_calls.is_empty()
    }

    pub fn into_create_request(self, chat_id: &str) -> Result<CreateMessageRequest> {
        let tool_calls = if self.tool_calls.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&self.tool_calls).context("serialize tool calls")?)
        };
        let tool_results = if self.tool_results.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&self.tool_results).context("serialize tool results")?)
        };

        Ok(CreateMessageRequest {
            chat_id: chat_id.to_string(),
            role: MessageRole::Assistant,
            content: self.text,
            tool_calls,
            tool_results,
            model: None,
        })
    }
}

pub fn extract_content(events: &[Event], persisted_count: usize) -> ExtractedContent {
    let mut text_parts: Vec<&str> = Vec::new();
    let mut tool_calls = Vec::new();
    let mut tool_results = Vec::new();

    for event in filter_to_current_turn(events, persisted_count) {
        match event {
            Event::Assistant { message } => {
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text: Some(text) } if !text.is_empty() => {
                            text_parts.push(text);
                        }
                        ContentBlock::ToolUse {
                            id: Some(id),
                            name: Some(name),
                            input,
                        } => tool_calls.push(ToolCall {
                            id: id.clone(),
                            name: name.clone(),
                            input: tool_input_object(input.as_ref()),
                        }),
                        _ => {}
                    }
                }
            }
            Event::User { message } => {
                for block in &message.content {
                    if let ContentBlock::ToolResult {
                        tool_use_id: Some(tool_use_id),
                        content,
                        is_error,
                    } = block
                    {
                        tool_results.push(ToolResult {
                            tool_use_id: tool_use_id.clone(),
                            content: tool_result_text(content.as_ref()),
                            is_error: is_error.unwrap_or(false),
                        });
                    }
                }
            }
            Event::System { .. } | Event::Result { .. } | Event::Unknown => {}
        }
    }

    ExtractedContent {
        text: text_parts.join(TEXT_PART_SEPARATOR),
        tool_calls,
        tool_results,
    }
}

use super::super::display_item::{DisplayItem, ToolDisplay};
use crate::types::{tool_input_object, tool_result_text, ContentBlock, Event};
use std::collections::HashMap;

const UNKNOWN_RESULT_SUBTYPE: &str = "unknown";

/// Tool invocations awaiting a result, iterated in arrival order.
#[derive(Default)]
struct PendingTools {
    order: Vec<String>,
    tools: HashMap<String, ToolDisplay>,
}

impl PendingTools {
    fn insert(&mut self, tool: ToolDisplay) {
        if !self.tools.contains_key(&tool.id) {
            self.order.push(tool.id.clone());
        }
        self.tools.insert(tool.id.clone(), tool);
    }

    fn take(&mut self, id: &str) -> Option<ToolDisplay> {
        let tool = self.tools.remove(id)?;
        self.order.retain(|pending| pending != id);
        Some(tool)
    }

    fn drain(self) -> impl Iterator<Item = ToolDisplay> {
        let Self { order, mut tools } = self;
        order.into_iter().filter_map(move |id| tools.remove(&id))
    }
}

/// Builds the render view of a full event log.
///
/// Tool cards are emitted when their result arrives; invocations still
/// waiting on a result are appended at the end without output.
pub fn project_display_items(events: &[Event]) -> Vec<DisplayItem> {
    let mut items = Vec::new();
    let mut pending = PendingTools::default();

    for event in events {
        match event {
            Event::Assistant { message } => {
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text: Some(text) } if !text.is_empty() => {
                            items.push(DisplayItem::Text {
                                content: text.clone(),
                            });
                        }
                        ContentBlock::ToolUse {
                            id: Some(id),
                            name: Some(name),
                            input,
                        } => pending.insert(ToolDisplay {
                            id: id.clone(),
                            name: name.clone(),
                            input: tool_input_object(input.as_ref()),
                            output: None,
                            is_error: None,
                        }),
                        _ => {}
                    }
                }
            }
            Event::User { message } => {
                for block in &message.content {
                    let ContentBlock::ToolResult {
                        tool_use_id: Some(tool_use_id),
                        content,
                        is_error,
                    } = block
                    else {
                        continue;
                    };
                    let Some(mut tool) = pending.take(tool_use_id) else {
                        continue;
                    };
                    tool.output = Some(tool_result_text(content.as_ref()));
                    tool.is_error = Some(is_error.unwrap_or(false));
                    items.push(DisplayItem::Tool { tool });
                }
            }
            Event::Result { subtype, .. } => items.push(DisplayItem::Result {
                subtype: subtype
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_RESULT_SUBTYPE.to_string()),
            }),
            Event::System { .. } | Event::Unknown => {}
        }
    }

    items.extend(pending.drain().map(|tool| DisplayItem::Tool { tool }));
    items
}

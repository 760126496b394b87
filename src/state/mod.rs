mod display_item;
pub mod transcript;

pub use display_item::{DisplayItem, ToolDisplay};
pub use transcript::{
    extract_content, filter_to_current_turn, project_display_items, ExtractedContent, ToolCall,
    ToolResult,
};

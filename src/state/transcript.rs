mod display;
mod extract;
mod turn;


pub use display::project_display_items;
pub use extract::{extract_content, ExtractedContent, ToolCall, ToolResult};
pub use turn::filter_to_current_turn;

mod event;
mod message;
mod process;

pub use event::{tool_input_object, tool_result_text, ContentBlock, Event, EventMessage};
pub use message::{count_assistant_messages, CreateMessageRequest, MessageRole, StoredMessage};
pub use process::{OutputType, ProcessOutputEvent, ProcessStatus, ProcessStatusEvent};

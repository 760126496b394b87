pub mod event_log;
pub mod stream;

pub use event_log::{EventLog, IngestOutcome};
pub use stream::StreamParser;

mod driver;
mod orchestrator;
mod ports;

pub use driver::{DisplayUpdate, SessionDriver, SessionInput};
pub use orchestrator::{
    CompletionAction, PersistJob, PersistOutcome, SessionOrchestrator, SessionPhase,
};
pub use ports::{ChatStore, Notification, NotificationSink};

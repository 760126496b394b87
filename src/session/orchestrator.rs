use super::ports::{ChatStore, Notification, NotificationSink};
use crate::logging::emit_debug_payload;
use crate::state::{extract_content, project_display_items, DisplayItem};
use crate::types::{CreateMessageRequest, Event, StoredMessage};
use anyhow::Result;
use std::sync::Arc;

const SAVE_FAILED_TITLE: &str = "Failed to save response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Streaming,
    Completing,
}

/// Persistence request for one completed process, captured at completion time.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistJob {
    pub process_id: String,
    pub request: CreateMessageRequest,
}

impl PersistJob {
    pub async fn run(self, store: &dyn ChatStore) -> PersistOutcome {
        let result = store.create_message(self.request).await;
        PersistOutcome {
            process_id: self.process_id,
            result,
        }
    }
}

#[derive(Debug)]
pub struct PersistOutcome {
    pub process_id: String,
    pub result: Result<StoredMessage>,
}

#[derive(Debug, PartialEq)]
pub enum CompletionAction {
    /// The signal was for a process that is not active.
    Ignored,
    /// This process was already handed to persistence.
    AlreadySaved,
    /// The turn produced no text and no tool calls.
    NothingToSave,
    /// The request could not be built; the failure was already reported.
    Failed,
    Persist(PersistJob),
}

/// Tracks the active executor process of one chat and persists each
/// completed turn at most once.
pub struct SessionOrchestrator {
    chat_id: String,
    phase: SessionPhase,
    active_process_id: Option<String>,
    last_saved_process_id: Option<String>,
    display_items: Vec<DisplayItem>,
    notifier: Arc<dyn NotificationSink>,
}

impl SessionOrchestrator {
    pub fn new(chat_id: impl Into<String>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            chat_id: chat_id.into(),
            phase: SessionPhase::Idle,
            active_process_id: None,
            last_saved_process_id: None,
            display_items: Vec::new(),
            notifier,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn active_process_id(&self) -> Option<&str> {
        self.active_process_id.as_deref()
    }

    pub fn display_items(&self) -> &[DisplayItem] {
        &self.display_items
    }

    pub fn start(&mut self, process_id: &str) {
        if self.last_saved_process_id.as_deref() != Some(process_id) {
            self.last_saved_process_id = None;
        }
        if !self.is_active(process_id) {
            self.display_items.clear();
        }
        tracing::debug!(chat_id = %self.chat_id, process_id, "session streaming");
        self.active_process_id = Some(process_id.to_string());
        self.phase = SessionPhase::Streaming;
    }

    /// Recomputes the display projection; returns `None` for inactive processes.
    pub fn on_events(&mut self, process_id: &str, events: &[Event]) -> Option<&[DisplayItem]> {
        if !self.is_active(process_id) {
            return None;
        }
        self.display_items = project_display_items(events);
        Some(&self.display_items)
    }

    pub fn on_complete(
        &mut self,
        process_id: &str,
        events: &[Event],
        persisted_assistant_count: usize,
    ) -> CompletionAction {
        if !self.is_active(process_id) {
            return CompletionAction::Ignored;
        }
        if self.last_saved_process_id.as_deref() == Some(process_id) {
            return CompletionAction::AlreadySaved;
        }
        // Marked before persisting so a second completion signal is a no-op.
        self.last_saved_process_id = Some(process_id.to_string());

        let content = extract_content(events, persisted_assistant_count);
        if content.is_empty() {
            tracing::debug!(chat_id = %self.chat_id, process_id, "turn produced nothing to save");
            self.finish();
            return CompletionAction::NothingToSave;
        }

        let request = content.into_create_request(&self.chat_id);
        self.prepare_persist(process_id, request)
    }

    fn prepare_persist(
        &mut self,
        process_id: &str,
        request: Result<CreateMessageRequest>,
    ) -> CompletionAction {
        match request {
            Ok(request) => {
                emit_debug_payload("persisting assistant turn", &request);
                self.phase = SessionPhase::Completing;
                CompletionAction::Persist(PersistJob {
                    process_id: process_id.to_string(),
                    request,
                })
            }
            Err(e) => {
                self.report_failure(process_id, &e);
                self.finish();
                CompletionAction::Failed
            }
        }
    }

    pub fn on_persist_settled(&mut self, outcome: PersistOutcome) {
        match &outcome.result {
            Ok(message) => tracing::info!(
                chat_id = %self.chat_id,
                process_id = %outcome.process_id,
                message_id = %message.id,
                "assistant turn saved"
            ),
            Err(e) => self.report_failure(&outcome.process_id, e),
        }

        if self.is_active(&outcome.process_id) {
            self.finish();
        }
    }

    fn report_failure(&self, process_id: &str, error: &anyhow::Error) {
        tracing::warn!(
            chat_id = %self.chat_id,
            process_id,
            "saving assistant turn failed: {error:#}"
        );
        self.notifier
            .notify(Notification::error(SAVE_FAILED_TITLE, format!("{error:#}")));
    }

    pub fn is_active(&self, process_id: &str) -> bool {
        self.active_process_id.as_deref() == Some(process_id)
    }

    fn finish(&mut self) {
        self.active_process_id = None;
        self.phase = SessionPhase::Idle;
    }
}

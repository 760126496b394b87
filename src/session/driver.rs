use super::orchestrator::{CompletionAction, PersistJob, PersistOutcome, SessionOrchestrator};
use super::ports::ChatStore;
use crate::api::EventLog;
use crate::state::DisplayItem;
use crate::types::{ProcessOutputEvent, ProcessStatusEvent};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

/// Inputs pushed by the event source and the message store.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Start { process_id: String },
    Output(ProcessOutputEvent),
    Status(ProcessStatusEvent),
    /// Assistant messages currently stored for the chat.
    PersistedCount(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub process_id: String,
    pub items: Vec<DisplayItem>,
}

/// Drives a [`SessionOrchestrator`] from channel inputs.
///
/// Saves and session-id writes run as spawned tasks and are joined back
/// into the loop, so output keeps being projected while they are in flight.
/// Only the active process's output is kept.
pub struct SessionDriver {
    orchestrator: SessionOrchestrator,
    event_log: EventLog,
    store: Arc<dyn ChatStore>,
    display_tx: mpsc::UnboundedSender<DisplayUpdate>,
    persisted_assistant_count: usize,
    saves: JoinSet<PersistOutcome>,
    session_writes: JoinSet<()>,
}

impl SessionDriver {
    pub fn new(
        orchestrator: SessionOrchestrator,
        store: Arc<dyn ChatStore>,
        display_tx: mpsc::UnboundedSender<DisplayUpdate>,
    ) -> Self {
        Self {
            orchestrator,
            event_log: EventLog::new(),
            store,
            display_tx,
            persisted_assistant_count: 0,
            saves: JoinSet::new(),
            session_writes: JoinSet::new(),
        }
    }

    /// Runs until `inputs` closes and every spawned task has finished.
    pub async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<SessionInput>,
    ) -> SessionOrchestrator {
        let mut inputs_open = true;

        while inputs_open || !self.saves.is_empty() || !self.session_writes.is_empty() {
            tokio::select! {
                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => self.handle(input),
                    None => inputs_open = false,
                },
                Some(joined) = self.saves.join_next(), if !self.saves.is_empty() => {
                    self.on_save_joined(joined);
                }
                Some(joined) = self.session_writes.join_next(), if !self.session_writes.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!("session id write did not finish: {e}");
                    }
                }
                else => break,
            }
        }

        self.orchestrator
    }

    fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Start { process_id } => {
                self.event_log.clear();
                self.orchestrator.start(&process_id);
            }
            SessionInput::Output(output) => {
                if !self.orchestrator.is_active(&output.process_id) {
                    tracing::debug!(
                        process_id = %output.process_id,
                        "dropping output of inactive process"
                    );
                    return;
                }
                let ingest = self.event_log.ingest(&output);
                if let Some(session_id) = ingest.session_id {
                    self.spawn_session_id_write(session_id);
                }
                if ingest.new_events > 0 {
                    self.publish(&output.process_id);
                }
            }
            SessionInput::Status(status) => {
                if !status.status.is_terminal() || !self.orchestrator.is_active(&status.process_id)
                {
                    return;
                }
                self.event_log.mark_complete(&status.process_id);
                self.publish(&status.process_id);
                let action = self.orchestrator.on_complete(
                    &status.process_id,
                    self.event_log.events(&status.process_id),
                    self.persisted_assistant_count,
                );
                if let CompletionAction::Persist(job) = action {
                    self.spawn_persist(job);
                }
                self.evict_if_inactive(&status.process_id);
            }
            SessionInput::PersistedCount(count) => self.persisted_assistant_count = count,
        }
    }

    fn publish(&mut self, process_id: &str) {
        let events = self.event_log.events(process_id);
        let Some(items) = self.orchestrator.on_events(process_id, events) else {
            return;
        };
        let update = DisplayUpdate {
            process_id: process_id.to_string(),
            items: items.to_vec(),
        };
        if self.display_tx.send(update).is_err() {
            tracing::debug!(process_id, "display consumer dropped");
        }
    }

    fn evict_if_inactive(&mut self, process_id: &str) {
        if !self.orchestrator.is_active(process_id) {
            self.event_log.reset(process_id);
        }
    }

    fn on_save_joined(&mut self, joined: Result<PersistOutcome, JoinError>) {
        match joined {
            Ok(outcome) => {
                let process_id = outcome.process_id.clone();
                self.orchestrator.on_persist_settled(outcome);
                self.evict_if_inactive(&process_id);
            }
            Err(e) => tracing::error!("save task did not finish: {e}"),
        }
    }

    fn spawn_session_id_write(&mut self, session_id: String) {
        let store = Arc::clone(&self.store);
        let chat_id = self.orchestrator.chat_id().to_string();
        self.session_writes.spawn(async move {
            if let Err(e) = store.set_session_id(&chat_id, &session_id).await {
                tracing::warn!(%chat_id, %session_id, "failed to record session id: {e:#}");
            }
        });
    }

    fn spawn_persist(&mut self, job: PersistJob) {
        let store = Arc::clone(&self.store);
        let process_id = job.process_id.clone();
        self.saves.spawn(async move {
            match AssertUnwindSafe(job.run(store.as_ref())).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => PersistOutcome {
                    process_id,
                    result: Err(anyhow::anyhow!(
                        "save task panicked: {}",
                        panic_message(panic.as_ref())
                    )),
                },
            }
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

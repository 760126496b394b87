use anyhow::Result;
use chatline::session::{
    ChatStore, CompletionAction, DisplayUpdate, Notification, NotificationSink, SessionDriver,
    SessionInput, SessionOrchestrator, SessionPhase,
};
use chatline::state::{extract_content, filter_to_current_turn, ExtractedContent};
use chatline::types::{
    ContentBlock, CreateMessageRequest, Event, MessageRole, ProcessOutputEvent, ProcessStatus,
    ProcessStatusEvent, StoredMessage,
};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct MemoryStore {
    messages: Mutex<Vec<StoredMessage>>,
}

impl ChatStore for MemoryStore {
    fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> BoxFuture<'_, Result<StoredMessage>> {
        Box::pin(async move {
            let mut messages = self.messages.lock().unwrap();
            let stored = StoredMessage {
                id: format!("msg-{}", messages.len() + 1),
                chat_id: request.chat_id,
                role: request.role,
                content: request.content,
                tool_calls: request.tool_calls,
                tool_results: request.tool_results,
                is_streaming: false,
                tokens_used: None,
                model: request.model,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            };
            messages.push(stored.clone());
            Ok(stored)
        })
    }

    fn set_session_id<'a>(
        &'a self,
        _chat_id: &'a str,
        _session_id: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Default)]
struct Toasts(Mutex<Vec<Notification>>);

impl NotificationSink for Toasts {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

fn hi_turn() -> Vec<Event> {
    vec![
        Event::assistant(vec![ContentBlock::text("Hi")]),
        Event::result("success"),
    ]
}

#[test]
fn test_single_turn_extracts_text_only() {
    assert_eq!(
        extract_content(&hi_turn(), 0),
        ExtractedContent {
            text: "Hi".to_string(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    );
}

#[test]
fn test_trailing_events_after_persisted_turns() {
    let mut events = hi_turn();
    events.extend(hi_turn());
    events.extend(hi_turn());
    let trailing = vec![
        Event::assistant(vec![ContentBlock::text("still going")]),
        Event::user(vec![ContentBlock::tool_result("t1", "ok", false)]),
    ];
    events.extend(trailing.clone());

    assert_eq!(filter_to_current_turn(&events, 3), trailing.as_slice());
    assert!(filter_to_current_turn(&events[..6], 3).is_empty());
}

#[tokio::test]
async fn test_orchestrator_persists_single_turn_once() {
    let store = MemoryStore::default();
    let mut session = SessionOrchestrator::new("chat-1", Arc::new(Toasts::default()));
    session.start("proc-1");

    let CompletionAction::Persist(job) = session.on_complete("proc-1", &hi_turn(), 0) else {
        panic!("expected a persistence job");
    };
    assert_eq!(
        job.request,
        CreateMessageRequest {
            chat_id: "chat-1".to_string(),
            role: MessageRole::Assistant,
            content: "Hi".to_string(),
            tool_calls: None,
            tool_results: None,
            model: None,
        }
    );
    assert_eq!(
        session.on_complete("proc-1", &hi_turn(), 0),
        CompletionAction::AlreadySaved
    );

    session.on_persist_settled(job.run(&store).await);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(store.messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_driver_saves_each_process_turn() {
    let store = Arc::new(MemoryStore::default());
    let (display_tx, mut display_rx) = mpsc::unbounded_channel::<DisplayUpdate>();
    let (inputs, inputs_rx) = mpsc::unbounded_channel();
    let driver = SessionDriver::new(
        SessionOrchestrator::new("chat-1", Arc::new(Toasts::default())),
        store.clone(),
        display_tx,
    );
    let handle = tokio::spawn(driver.run(inputs_rx));

    let turn_lines = [
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Hi"}]}}"#,
        r#"{"type":"result","subtype":"success"}"#,
    ];

    for (index, process_id) in ["proc-1", "proc-2"].into_iter().enumerate() {
        inputs.send(SessionInput::PersistedCount(index)).unwrap();
        inputs
            .send(SessionInput::Start {
                process_id: process_id.to_string(),
            })
            .unwrap();
        // A resumed process replays the turns stored before it.
        for line in std::iter::repeat(turn_lines).take(index + 1).flatten() {
            inputs
                .send(SessionInput::Output(ProcessOutputEvent::stdout(process_id, line)))
                .unwrap();
        }
        inputs
            .send(SessionInput::Status(ProcessStatusEvent {
                process_id: process_id.to_string(),
                status: ProcessStatus::Completed,
                exit_code: Some(0),
            }))
            .unwrap();
    }
    drop(inputs);

    handle.await.unwrap();
    let messages = store.messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.content == "Hi"));

    let mut updates = 0;
    while display_rx.try_recv().is_ok() {
        updates += 1;
    }
    assert!(updates >= 2);
}

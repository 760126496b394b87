use super::stream::StreamParser;
use crate::types::{Event, OutputType, ProcessOutputEvent};
use std::collections::HashMap;

#[derive(Default)]
struct ProcessLog {
    parser: StreamParser,
    events: Vec<Event>,
    complete: bool,
    session_id: Option<String>,
}

/// Accumulated stream events per executor process.
#[derive(Default)]
pub struct EventLog {
    processes: HashMap<String, ProcessLog>,
}

/// What a single ingest changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub new_events: usize,
    /// Set the first time a process reports its resumption id.
    pub session_id: Option<String>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, output: &ProcessOutputEvent) -> IngestOutcome {
        if output.output_type == OutputType::Stderr {
            tracing::debug!(process_id = %output.process_id, "ignoring stderr output");
            return IngestOutcome::default();
        }

        let log = self
            .processes
            .entry(output.process_id.clone())
            .or_default();
        let events = log.parser.push_line(&output.content);

        let mut outcome = IngestOutcome {
            new_events: events.len(),
            session_id: None,
        };
        for event in &events {
            if log.session_id.is_none() {
                if let Some(session_id) = event.session_id() {
                    log.session_id = Some(session_id.to_string());
                    outcome.session_id = Some(session_id.to_string());
                }
            }
        }
        log.events.extend(events);
        outcome
    }

    pub fn mark_complete(&mut self, process_id: &str) {
        let log = self.processes.entry(process_id.to_string()).or_default();
        log.events.extend(log.parser.finish());
        log.complete = true;
    }

    pub fn events(&self, process_id: &str) -> &[Event] {
        self.processes
            .get(process_id)
            .map(|log| log.events.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_complete(&self, process_id: &str) -> bool {
        self.processes
            .get(process_id)
            .is_some_and(|log| log.complete)
    }

    pub fn session_id(&self, process_id: &str) -> Option<&str> {
        self.processes
            .get(process_id)
            .and_then(|log| log.session_id.as_deref())
    }

    /// Drops everything recorded for a process, e.g. before a resubscription
    /// that replays history from the start.
    pub fn reset(&mut self, process_id: &str) {
        self.processes.remove(process_id);
    }

    pub fn clear(&mut self) {
        self.processes.clear();
    }

    /// Number of processes with recorded state.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT: &str = r#"{"type":"system","subtype":"init","session_id":"sess-1"}"#;
    const HELLO: &str = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Hi"}]}}"#;
    const DONE: &str = r#"{"type":"result","subtype":"success","session_id":"sess-1"}"#;

    #[test]
    fn test_events_are_kept_per_process() {
        let mut log = EventLog::new();
        log.ingest(&ProcessOutputEvent::stdout("p1", HELLO));
        log.ingest(&ProcessOutputEvent::stdout("p2", DONE));
        log.ingest(&ProcessOutputEvent::stdout("p1", DONE));

        assert_eq!(log.events("p1").len(), 2);
        assert_eq!(
            log.events("p2"),
            &[Event::Result {
                subtype: Some("success".to_string()),
                is_error: None,
                result: None,
                session_id: Some("sess-1".to_string()),
            }]
        );
        assert!(log.events("missing").is_empty());
    }

    #[test]
    fn test_session_id_is_reported_once() {
        let mut log = EventLog::new();
        let first = log.ingest(&ProcessOutputEvent::stdout("p1", INIT));
        assert_eq!(first.session_id.as_deref(), Some("sess-1"));
        assert_eq!(first.new_events, 1);

        log.ingest(&ProcessOutputEvent::stdout("p1", HELLO));
        let last = log.ingest(&ProcessOutputEvent::stdout("p1", DONE));
        assert_eq!(last.session_id, None);
        assert_eq!(log.session_id("p1"), Some("sess-1"));
    }

    #[test]
    fn test_stderr_and_garbage_do_not_add_events() {
        let mut log = EventLog::new();
        let mut stderr = ProcessOutputEvent::stdout("p1", HELLO);
        stderr.output_type = OutputType::Stderr;

        assert_eq!(log.ingest(&stderr), IngestOutcome::default());
        let garbage = log.ingest(&ProcessOutputEvent::stdout("p1", "warning: retrying"));
        assert_eq!(garbage.new_events, 0);
        assert!(log.events("p1").is_empty());
    }

    #[test]
    fn test_mark_complete_and_reset() {
        let mut log = EventLog::new();
        log.ingest(&ProcessOutputEvent::stdout("p1", HELLO));
        assert!(!log.is_complete("p1"));

        log.mark_complete("p1");
        assert!(log.is_complete("p1"));

        log.reset("p1");
        assert!(!log.is_complete("p1"));
        assert!(log.events("p1").is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_clear_drops_every_process() {
        let mut log = EventLog::new();
        log.ingest(&ProcessOutputEvent::stdout("p1", HELLO));
        log.ingest(&ProcessOutputEvent::stdout("p2", HELLO));
        assert_eq!(log.len(), 2);

        log.clear();
        assert!(log.is_empty());
        assert!(log.events("p2").is_empty());
    }
}

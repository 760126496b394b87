use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Completed,
    Failed,
    Killed,
}

impl ProcessStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One chunk of process output, usually a single stdout line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutputEvent {
    pub process_id: String,
    pub output_type: OutputType,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatusEvent {
    pub process_id: String,
    pub status: ProcessStatus,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

impl ProcessOutputEvent {
    pub fn stdout(process_id: &str, content: &str) -> Self {
        Self {
            process_id: process_id.to_string(),
            output_type: OutputType::Stdout,
            content: content.to_string(),
            timestamp: String::new(),
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a remote assistant run as reported by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }

    /// `requires_action` is terminal here: no tool outputs are ever submitted, so the run
    /// cannot progress on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::Failed
                | Self::Cancelled
                | Self::Expired
                | Self::Incomplete
                | Self::RequiresAction
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assistant interaction: a fresh thread plus the run executing on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationRun {
    pub thread_id: String,
    pub run_id: String,
    pub status: RunStatus,
    pub polls: u32,
}

impl ConversationRun {
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>, status: RunStatus) -> Self {
        Self { thread_id: thread_id.into(), run_id: run_id.into(), status, polls: 0 }
    }

    pub fn record_poll(&mut self, status: RunStatus) {
        self.status = status;
        self.polls += 1;
    }
}

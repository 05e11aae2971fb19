use std::time::Duration;

use crate::domain::run::RunStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Created,
    Running,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// What the poller does after observing a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollDecision {
    /// Sleep for the interval, then poll again.
    Wait(Duration),
    /// The run completed; fetch its message.
    Fetch,
    /// The run settled in a non-completed terminal status.
    Abort(RunStatus),
    /// The poll budget ran out while the run was still active.
    Exhausted(RunStatus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(3), max_polls: 200 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollTransition {
    pub from: RunPhase,
    pub to: RunPhase,
    pub status: RunStatus,
    pub decision: PollDecision,
}

use std::fmt;

use thiserror::Error;

use crate::document::DocumentError;
use crate::domain::run::RunStatus;

/// Failure of a single remote call, independent of where in a pipeline it happened.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("the remote service rejected the credential")]
    Authentication,
    #[error("rate limit or quota exceeded: {0}")]
    RateLimited(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("remote service returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssistantOperation {
    CreateThread,
    PostMessage,
    CreateRun,
    RetrieveRun,
    ListMessages,
}

impl AssistantOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateThread => "create_thread",
            Self::PostMessage => "post_message",
            Self::CreateRun => "create_run",
            Self::RetrieveRun => "retrieve_run",
            Self::ListMessages => "list_messages",
        }
    }
}

impl fmt::Display for AssistantOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a remote call was made when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteCall {
    ChainStep(usize),
    Assistant(AssistantOperation),
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChainStep(step) => write!(f, "chain step {step}"),
            Self::Assistant(operation) => write!(f, "assistant {operation}"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OptimizerError {
    #[error("incomplete input: missing {}", .fields.join(", "))]
    MissingInput { fields: Vec<&'static str> },
    #[error("document lookup failed for `{dataset}`: {source}")]
    DocumentLookupFailed {
        dataset: String,
        #[source]
        source: DocumentError,
    },
    #[error("authentication failed during {call}")]
    AuthenticationFailed { call: RemoteCall },
    #[error("remote call failed at step {step}: {source}")]
    RemoteCallFailed {
        step: usize,
        #[source]
        source: RemoteError,
    },
    #[error("assistant call `{operation}` failed: {source}")]
    AssistantCallFailed {
        operation: AssistantOperation,
        #[source]
        source: RemoteError,
    },
    #[error("run `{run_id}` did not complete: last status `{status}` after {attempts} polls")]
    RunNotCompleted { run_id: String, status: RunStatus, attempts: u32 },
    #[error("operation cancelled before completion")]
    Cancelled,
}

/// What the caller should do about a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectiveAction {
    FixInput,
    CheckDataset,
    RetryLater,
    InvestigateRun,
    Rerun,
}

impl OptimizerError {
    /// Classifies a chain step failure. A rejected credential is reported on its own so the
    /// caller can tell it apart from a transport problem.
    pub fn chain_step(step: usize, source: RemoteError) -> Self {
        match source {
            RemoteError::Authentication => {
                Self::AuthenticationFailed { call: RemoteCall::ChainStep(step) }
            }
            source => Self::RemoteCallFailed { step, source },
        }
    }

    pub fn assistant(operation: AssistantOperation, source: RemoteError) -> Self {
        match source {
            RemoteError::Authentication => {
                Self::AuthenticationFailed { call: RemoteCall::Assistant(operation) }
            }
            source => Self::AssistantCallFailed { operation, source },
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "missing_input",
            Self::DocumentLookupFailed { .. } => "document_lookup_failed",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::RemoteCallFailed { .. } => "remote_call_failed",
            Self::AssistantCallFailed { .. } => "assistant_call_failed",
            Self::RunNotCompleted { .. } => "run_not_completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn corrective_action(&self) -> CorrectiveAction {
        match self {
            Self::MissingInput { .. } | Self::AuthenticationFailed { .. } => {
                CorrectiveAction::FixInput
            }
            Self::DocumentLookupFailed { .. } => CorrectiveAction::CheckDataset,
            Self::RemoteCallFailed { .. } | Self::AssistantCallFailed { .. } => {
                CorrectiveAction::RetryLater
            }
            Self::RunNotCompleted { .. } => CorrectiveAction::InvestigateRun,
            Self::Cancelled => CorrectiveAction::Rerun,
        }
    }
}

impl CorrectiveAction {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::FixInput => "Check the provided fields and API key, then try again.",
            Self::CheckDataset => "The reference dataset could not be read. Check that it exists.",
            Self::RetryLater => "The language model service failed. Please retry shortly.",
            Self::InvestigateRun => {
                "The assistant run never completed. Inspect the run before asking again."
            }
            Self::Rerun => "The operation was interrupted. Run it again when ready.",
        }
    }
}

pub mod chain;
pub mod config;
pub mod document;
pub mod domain;
pub mod errors;
pub mod polling;
pub mod sink;

pub use chain::{CompanyHandler, CompanyRouter, STEPS, STEP_COUNT};
pub use document::{DocumentError, DocumentSource, Table};
pub use domain::analysis::{AnalysisContext, AnalysisRequest};
pub use domain::credential::Credential;
pub use domain::run::{ConversationRun, RunStatus};
pub use domain::step::{RenderedPrompt, StepResult, StepSpec};
pub use errors::{AssistantOperation, CorrectiveAction, OptimizerError, RemoteCall, RemoteError};
pub use polling::{PollDecision, PollPolicy, RunPhase, RunTracker};
pub use sink::{InMemoryStepSink, StepSink};

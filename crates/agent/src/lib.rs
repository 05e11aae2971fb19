//! Agent Runtime - remote model calls behind the value proposition optimizer
//!
//! This crate drives the two remote conversations the optimizer needs:
//! - `chain`: the fixed eight-step analysis chain over a chat completion client
//! - `assistant`: one question answered by a hosted assistant run, polled to completion
//!
//! # Key Types
//!
//! - `CompletionClient` / `AssistantClient` - transport seams (see `llm` module)
//! - `OpenAiClient` - HTTP implementation of both against an OpenAI-compatible API
//! - `ChainOrchestrator` - runs the step catalog and streams results to a `StepSink`
//! - `AssistantRunner` - thread, message, run, poll, fetch
//!
//! The credential is passed into every call. Nothing here caches it.

pub mod assistant;
pub mod chain;
pub mod llm;
pub mod openai;
pub mod scripted;

pub use assistant::{AssistantAnswer, AssistantRunner};
pub use chain::{AnalysisOutcome, ChainOrchestrator};
pub use llm::{AssistantClient, CompletionClient, RunHandle};
pub use openai::OpenAiClient;
pub use scripted::{ScriptedAssistantClient, ScriptedCompletionClient};

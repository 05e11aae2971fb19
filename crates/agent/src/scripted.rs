//! Deterministic in-process clients for tests and offline runs.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use valprop_core::{AssistantOperation, Credential, InMemoryStepSink, RemoteError, RunStatus};

use crate::llm::{AssistantClient, CompletionClient, RunHandle};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCompletion {
    pub system_instruction: String,
    pub human_turn: String,
    /// Number of step results the observed sink held when this call started.
    pub emitted_before: Option<usize>,
}

/// Completion client whose reply is a pure function of its inputs.
#[derive(Clone, Default)]
pub struct ScriptedCompletionClient {
    calls: Arc<Mutex<Vec<RecordedCompletion>>>,
    failure: Option<(usize, RemoteError)>,
    stall: Option<usize>,
    observed_sink: Option<InMemoryStepSink>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the call with zero-based index `call` with `error`.
    pub fn failing_at(mut self, call: usize, error: RemoteError) -> Self {
        self.failure = Some((call, error));
        self
    }

    /// Never answers the call with zero-based index `call`.
    pub fn stalling_at(mut self, call: usize) -> Self {
        self.stall = Some(call);
        self
    }

    /// Records how many results `sink` held at the start of every call.
    pub fn observing(mut self, sink: InMemoryStepSink) -> Self {
        self.observed_sink = Some(sink);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCompletion> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn reply_for(system_instruction: &str, human_turn: &str) -> String {
        let topic = system_instruction.lines().next().unwrap_or_default().trim();
        format!("analysis of `{topic}` given {} chars of context", human_turn.len())
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete_chat(
        &self,
        _credential: &Credential,
        system_instruction: &str,
        human_turn: &str,
    ) -> Result<String, RemoteError> {
        let emitted_before = self.observed_sink.as_ref().map(|sink| sink.results().len());
        let index = {
            let mut calls = lock(&self.calls);
            calls.push(RecordedCompletion {
                system_instruction: system_instruction.to_string(),
                human_turn: human_turn.to_string(),
                emitted_before,
            });
            calls.len() - 1
        };

        if self.stall == Some(index) {
            std::future::pending::<()>().await;
        }

        match &self.failure {
            Some((call, error)) if *call == index => Err(error.clone()),
            _ => Ok(Self::reply_for(system_instruction, human_turn)),
        }
    }
}

#[derive(Debug, Default)]
struct AssistantState {
    operations: Vec<AssistantOperation>,
    posted: Vec<(String, String)>,
    threads: u32,
    retrieves: usize,
}

/// Assistant client that replays a fixed status script.
///
/// The first status is returned by `create_run`; each `retrieve_run` returns the next one and
/// the last status repeats once the script runs out.
#[derive(Clone)]
pub struct ScriptedAssistantClient {
    statuses: Arc<Vec<RunStatus>>,
    answer: String,
    failure: Option<(AssistantOperation, RemoteError)>,
    state: Arc<Mutex<AssistantState>>,
}

impl ScriptedAssistantClient {
    pub fn new(statuses: impl Into<Vec<RunStatus>>, answer: impl Into<String>) -> Self {
        let mut statuses = statuses.into();
        if statuses.is_empty() {
            statuses.push(RunStatus::Completed);
        }
        Self {
            statuses: Arc::new(statuses),
            answer: answer.into(),
            failure: None,
            state: Arc::new(Mutex::new(AssistantState::default())),
        }
    }

    pub fn failing_on(mut self, operation: AssistantOperation, error: RemoteError) -> Self {
        self.failure = Some((operation, error));
        self
    }

    pub fn operations(&self) -> Vec<AssistantOperation> {
        lock(&self.state).operations.clone()
    }

    pub fn retrieve_count(&self) -> usize {
        lock(&self.state).retrieves
    }

    /// `(thread_id, content)` for every posted message.
    pub fn posted_messages(&self) -> Vec<(String, String)> {
        lock(&self.state).posted.clone()
    }

    fn record(&self, operation: AssistantOperation) -> Result<(), RemoteError> {
        lock(&self.state).operations.push(operation);
        match &self.failure {
            Some((failing, error)) if *failing == operation => Err(error.clone()),
            _ => Ok(()),
        }
    }

    fn status_at(&self, position: usize) -> RunStatus {
        let last = self.statuses.len() - 1;
        self.statuses[position.min(last)]
    }
}

#[async_trait]
impl AssistantClient for ScriptedAssistantClient {
    async fn create_thread(&self, _credential: &Credential) -> Result<String, RemoteError> {
        self.record(AssistantOperation::CreateThread)?;
        let mut state = lock(&self.state);
        state.threads += 1;
        Ok(format!("thread_{}", state.threads))
    }

    async fn post_message(
        &self,
        _credential: &Credential,
        thread_id: &str,
        content: &str,
    ) -> Result<(), RemoteError> {
        self.record(AssistantOperation::PostMessage)?;
        lock(&self.state).posted.push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_run(
        &self,
        _credential: &Credential,
        thread_id: &str,
        _assistant_id: &str,
    ) -> Result<RunHandle, RemoteError> {
        self.record(AssistantOperation::CreateRun)?;
        Ok(RunHandle { id: format!("run_{thread_id}"), status: self.status_at(0) })
    }

    async fn retrieve_run(
        &self,
        _credential: &Credential,
        _thread_id: &str,
        run_id: &str,
    ) -> Result<RunHandle, RemoteError> {
        self.record(AssistantOperation::RetrieveRun)?;
        let position = {
            let mut state = lock(&self.state);
            state.retrieves += 1;
            state.retrieves
        };
        Ok(RunHandle { id: run_id.to_string(), status: self.status_at(position) })
    }

    async fn latest_message(
        &self,
        _credential: &Credential,
        _thread_id: &str,
    ) -> Result<String, RemoteError> {
        self.record(AssistantOperation::ListMessages)?;
        Ok(self.answer.clone())
    }
}

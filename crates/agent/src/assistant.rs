use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use valprop_core::{
    AssistantOperation, ConversationRun, Credential, OptimizerError, PollDecision, PollPolicy,
    RunTracker,
};

use crate::chain::CREDENTIAL_FIELD;
use crate::llm::AssistantClient;

pub const QUESTION_FIELD: &str = "question";

/// Answer to one question, with the thread and run that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssistantAnswer {
    pub thread_id: String,
    pub run_id: String,
    pub polls: u32,
    pub text: String,
}

/// Asks a hosted assistant one question per invocation on a fresh thread.
pub struct AssistantRunner<A> {
    client: A,
    assistant_id: String,
    policy: PollPolicy,
}

impl<A> AssistantRunner<A>
where
    A: AssistantClient,
{
    pub fn new(client: A, assistant_id: impl Into<String>, policy: PollPolicy) -> Self {
        Self { client, assistant_id: assistant_id.into(), policy }
    }

    pub fn client(&self) -> &A {
        &self.client
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub async fn ask(
        &self,
        credential: &Credential,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AssistantAnswer, OptimizerError> {
        let mut missing = Vec::new();
        if credential.is_blank() {
            missing.push(CREDENTIAL_FIELD);
        }
        if question.trim().is_empty() {
            missing.push(QUESTION_FIELD);
        }
        if !missing.is_empty() {
            return Err(OptimizerError::MissingInput { fields: missing });
        }

        let correlation_id = Uuid::new_v4().to_string();
        let correlation_id = correlation_id.as_str();

        let thread_id = self
            .client
            .create_thread(credential)
            .await
            .map_err(|source| OptimizerError::assistant(AssistantOperation::CreateThread, source))?;
        self.client
            .post_message(credential, &thread_id, question)
            .await
            .map_err(|source| OptimizerError::assistant(AssistantOperation::PostMessage, source))?;
        let handle = self
            .client
            .create_run(credential, &thread_id, &self.assistant_id)
            .await
            .map_err(|source| OptimizerError::assistant(AssistantOperation::CreateRun, source))?;

        info!(
            event_name = "assistant.run.created",
            correlation_id,
            thread_id = %thread_id,
            run_id = %handle.id,
            status = %handle.status
        );

        let mut run = ConversationRun::new(thread_id, handle.id, handle.status);
        let mut tracker = RunTracker::new(self.policy);
        let mut transition = tracker.start(run.status);

        loop {
            match transition.decision {
                PollDecision::Fetch => break,
                PollDecision::Abort(status) | PollDecision::Exhausted(status) => {
                    warn!(
                        event_name = "assistant.run.not_completed",
                        correlation_id,
                        run_id = %run.run_id,
                        status = %status,
                        polls = tracker.polls()
                    );
                    return Err(OptimizerError::RunNotCompleted {
                        run_id: run.run_id,
                        status,
                        attempts: tracker.polls(),
                    });
                }
                PollDecision::Wait(interval) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            warn!(
                                event_name = "assistant.cancelled",
                                correlation_id,
                                run_id = %run.run_id
                            );
                            return Err(OptimizerError::Cancelled);
                        }
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
            }

            let polled = self
                .client
                .retrieve_run(credential, &run.thread_id, &run.run_id)
                .await
                .map_err(|source| {
                    OptimizerError::assistant(AssistantOperation::RetrieveRun, source)
                })?;
            run.record_poll(polled.status);
            transition = tracker.observe(polled.status);
            debug!(
                event_name = "assistant.run.polled",
                correlation_id,
                run_id = %run.run_id,
                status = %run.status,
                polls = run.polls
            );
        }

        let text = self
            .client
            .latest_message(credential, &run.thread_id)
            .await
            .map_err(|source| OptimizerError::assistant(AssistantOperation::ListMessages, source))?;

        info!(
            event_name = "assistant.run.completed",
            correlation_id,
            run_id = %run.run_id,
            polls = run.polls
        );

        Ok(AssistantAnswer { thread_id: run.thread_id, run_id: run.run_id, polls: run.polls, text })
    }
}

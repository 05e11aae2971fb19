use async_trait::async_trait;
use valprop_core::{Credential, RemoteError, RunStatus};

/// Single round-trip chat completion: one system instruction, one human turn.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete_chat(
        &self,
        credential: &Credential,
        system_instruction: &str,
        human_turn: &str,
    ) -> Result<String, RemoteError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunHandle {
    pub id: String,
    pub status: RunStatus,
}

/// Stateful assistant protocol: threads hold messages, runs execute the assistant on a thread.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn create_thread(&self, credential: &Credential) -> Result<String, RemoteError>;

    async fn post_message(
        &self,
        credential: &Credential,
        thread_id: &str,
        content: &str,
    ) -> Result<(), RemoteError>;

    async fn create_run(
        &self,
        credential: &Credential,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunHandle, RemoteError>;

    async fn retrieve_run(
        &self,
        credential: &Credential,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunHandle, RemoteError>;

    /// Text of the newest message on the thread.
    async fn latest_message(
        &self,
        credential: &Credential,
        thread_id: &str,
    ) -> Result<String, RemoteError>;
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use valprop_core::config::LlmConfig;
use valprop_core::{Credential, RemoteError, RunStatus};

use crate::llm::{AssistantClient, CompletionClient, RunHandle};

const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");
const ERROR_BODY_PREVIEW: usize = 200;

/// Client for an OpenAI-compatible HTTP API.
///
/// Holds no credential: every call receives the caller's token and attaches it as a bearer
/// header on that request only.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| RemoteError::Network(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn assistants_post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path)).header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
    }

    fn assistants_get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path)).header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
    }

    async fn execute<T>(
        &self,
        request: RequestBuilder,
        credential: &Credential,
        endpoint: &'static str,
    ) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
    {
        let response = request.bearer_auth(credential.expose()).send().await.map_err(|error| {
            warn!(event_name = "llm.request.failed", endpoint, error = %error, "request failed");
            RemoteError::Network(error.to_string())
        })?;

        let status = response.status();
        let body =
            response.text().await.map_err(|error| RemoteError::Network(error.to_string()))?;
        debug!(event_name = "llm.response.received", endpoint, status = status.as_u16());

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        decode(&body)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete_chat(
        &self,
        credential: &Credential,
        system_instruction: &str,
        human_turn: &str,
    ) -> Result<String, RemoteError> {
        let payload = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatTurn { role: "system", content: system_instruction },
                ChatTurn { role: "user", content: human_turn },
            ],
        };
        let request = self.http.post(self.url("chat/completions")).json(&payload);
        let completion: ChatCompletion =
            self.execute(request, credential, "chat.completions").await?;
        completion.into_text()
    }
}

#[async_trait]
impl AssistantClient for OpenAiClient {
    async fn create_thread(&self, credential: &Credential) -> Result<String, RemoteError> {
        let request = self.assistants_post("threads").json(&serde_json::json!({}));
        let thread: ThreadObject = self.execute(request, credential, "threads.create").await?;
        Ok(thread.id)
    }

    async fn post_message(
        &self,
        credential: &Credential,
        thread_id: &str,
        content: &str,
    ) -> Result<(), RemoteError> {
        let request = self
            .assistants_post(&format!("threads/{thread_id}/messages"))
            .json(&NewMessage { role: "user", content });
        let _: serde_json::Value = self.execute(request, credential, "messages.create").await?;
        Ok(())
    }

    async fn create_run(
        &self,
        credential: &Credential,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunHandle, RemoteError> {
        let request = self
            .assistants_post(&format!("threads/{thread_id}/runs"))
            .json(&NewRun { assistant_id });
        let run: RunObject = self.execute(request, credential, "runs.create").await?;
        Ok(run.into())
    }

    async fn retrieve_run(
        &self,
        credential: &Credential,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunHandle, RemoteError> {
        let request = self.assistants_get(&format!("threads/{thread_id}/runs/{run_id}"));
        let run: RunObject = self.execute(request, credential, "runs.retrieve").await?;
        Ok(run.into())
    }

    async fn latest_message(
        &self,
        credential: &Credential,
        thread_id: &str,
    ) -> Result<String, RemoteError> {
        let request = self
            .assistants_get(&format!("threads/{thread_id}/messages"))
            .query(&[("order", "desc"), ("limit", "1")]);
        let messages: MessageList = self.execute(request, credential, "messages.list").await?;
        messages.into_latest_text()
    }
}

/// Maps a non-success HTTP status to the remote error taxonomy.
pub fn classify_failure(status: u16, body: &str) -> RemoteError {
    let message = error_message(body);
    match status {
        401 | 403 => RemoteError::Authentication,
        429 => RemoteError::RateLimited(message),
        _ => RemoteError::Api { status, message },
    }
}

fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(ERROR_BODY_PREVIEW).collect()
}

fn decode<T>(body: &str) -> Result<T, RemoteError>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|error| RemoteError::MalformedResponse(error.to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatTurn<'a>; 2],
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct NewMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletion {
    fn into_text(self) -> Result<String, RemoteError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                RemoteError::MalformedResponse("completion contained no message content".into())
            })
    }
}

#[derive(Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
}

impl From<RunObject> for RunHandle {
    fn from(run: RunObject) -> Self {
        Self { id: run.id, status: run.status }
    }
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    content: Vec<MessageContent>,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<MessageText>,
}

#[derive(Deserialize)]
struct MessageText {
    value: String,
}

impl MessageList {
    fn into_latest_text(self) -> Result<String, RemoteError> {
        let message = self
            .data
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::MalformedResponse("thread has no messages".into()))?;

        message
            .content
            .into_iter()
            .filter(|part| part.kind == "text")
            .find_map(|part| part.text.map(|text| text.value))
            .ok_or_else(|| {
                RemoteError::MalformedResponse("latest message has no text content".into())
            })
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

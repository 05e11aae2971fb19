use std::path::PathBuf;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use valprop_agent::{AssistantClient, AssistantRunner, OpenAiClient};
use valprop_core::Credential;

use crate::commands::{
    build_runtime, cancel_on_interrupt, load_config, CommandResult, EXIT_RUNTIME_INIT,
};

const COMMAND: &str = "ask";

pub const INTRO: &str = "Welcome to the Cuitini Chatbot! - A Chatbot powered by OpenAI\n";

#[derive(Debug, Default)]
pub struct AskArgs {
    pub question: String,
    pub api_key: Option<SecretString>,
    pub json: bool,
    pub config_path: Option<PathBuf>,
}

pub fn run(args: AskArgs) -> CommandResult {
    let config = match load_config(COMMAND, args.config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let client = match OpenAiClient::new(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "client_init",
                format!("failed to build HTTP client: {error}"),
                EXIT_RUNTIME_INIT,
            );
        }
    };
    let runner = AssistantRunner::new(
        client,
        config.assistant.assistant_id.clone(),
        config.assistant.poll_policy(),
    );

    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let credential = args.api_key.map(Credential::from).unwrap_or_else(|| Credential::new(""));
    if !args.json {
        println!("{INTRO}");
    }

    let cancel = CancellationToken::new();
    runtime.block_on(async {
        let interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));
        let result = execute(&runner, &credential, &args.question, args.json, &cancel).await;
        interrupt.abort();
        result
    })
}

/// Asks one question and renders the answer, or the failure, for the terminal.
pub async fn execute<A>(
    runner: &AssistantRunner<A>,
    credential: &Credential,
    question: &str,
    json_output: bool,
    cancel: &CancellationToken,
) -> CommandResult
where
    A: AssistantClient,
{
    match runner.ask(credential, question, cancel).await {
        Ok(answer) if json_output => CommandResult::success(COMMAND, answer.text),
        Ok(answer) => CommandResult::text(answer.text),
        Err(error) => CommandResult::from_error(COMMAND, &error, json_output),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use valprop_agent::{AssistantRunner, ScriptedAssistantClient};
    use valprop_core::{Credential, PollPolicy, RunStatus};

    use super::execute;
    use crate::commands::{EXIT_MISSING_INPUT, EXIT_RUN_NOT_COMPLETED};

    fn runner(statuses: Vec<RunStatus>) -> AssistantRunner<ScriptedAssistantClient> {
        AssistantRunner::new(
            ScriptedAssistantClient::new(statuses, "Seed rounds start at 250k."),
            "asst_test",
            PollPolicy { interval: Duration::from_secs(3), max_polls: 10 },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn prints_the_answer_text() {
        let result = execute(
            &runner(vec![RunStatus::Queued, RunStatus::Completed]),
            &Credential::new("sk-test"),
            "How big are seed rounds?",
            false,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "Seed rounds start at 250k.");
    }

    #[tokio::test]
    async fn json_mode_wraps_the_answer_in_an_outcome() {
        let result = execute(
            &runner(vec![RunStatus::Completed]),
            &Credential::new("sk-test"),
            "How big are seed rounds?",
            true,
            &CancellationToken::new(),
        )
        .await;

        let payload: serde_json::Value =
            serde_json::from_str(&result.output).expect("outcome is JSON");
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["message"], "Seed rounds start at 250k.");
    }

    #[tokio::test]
    async fn empty_question_is_missing_input() {
        let result = execute(
            &runner(vec![RunStatus::Completed]),
            &Credential::new("sk-test"),
            "",
            false,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, EXIT_MISSING_INPUT);
        assert!(result.output.contains("missing question"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_run_maps_to_its_exit_code() {
        let result = execute(
            &runner(vec![RunStatus::Queued, RunStatus::Expired]),
            &Credential::new("sk-test"),
            "Anyone there?",
            true,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, EXIT_RUN_NOT_COMPLETED);
        let payload: serde_json::Value =
            serde_json::from_str(&result.output).expect("outcome is JSON");
        assert_eq!(payload["error_class"], "run_not_completed");
    }
}

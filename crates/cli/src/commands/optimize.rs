use std::path::PathBuf;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use valprop_agent::{AnalysisOutcome, ChainOrchestrator, CompletionClient, OpenAiClient};
use valprop_core::{AnalysisRequest, CompanyRouter, Credential, DocumentSource};
use valprop_docs::SpreadsheetSource;

use crate::commands::console::ConsoleSink;
use crate::commands::{
    build_runtime, cancel_on_interrupt, load_config, CommandResult, EXIT_RUNTIME_INIT,
};

const COMMAND: &str = "optimize";

pub const INTRO: &str = "Comprehensive Value Proposition Optimizer\n\nThis advanced tool \
methodically optimizes the value proposition of your company based on a deep, AI-powered analysis \
of the market and customer feedback. Each step in the prompt chain leverages integrating agents \
for thorough research and data synthesis.\n";

#[derive(Debug, Default)]
pub struct OptimizeArgs {
    pub request: AnalysisRequest,
    pub api_key: Option<SecretString>,
    pub json: bool,
    pub config_path: Option<PathBuf>,
}

pub fn run(args: OptimizeArgs) -> CommandResult {
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
    let chain = ChainOrchestrator::new(
        client,
        SpreadsheetSource::new(),
        CompanyRouter::with_special_case_dataset(&config.documents.special_case_dataset),
    )
    .with_carry_forward(config.chain.carry_forward_analysis);

    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let credential = args.api_key.map(Credential::from).unwrap_or_else(|| Credential::new(""));
    let console = ConsoleSink::stdout(args.json);
    if !args.json {
        console.write_intro(INTRO);
    }

    let request = args.request;
    let cancel = CancellationToken::new();
    runtime.block_on(async {
        let interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));
        let result = execute(&chain, &credential, request, &console, &cancel).await;
        interrupt.abort();
        result
    })
}

/// Runs the chain, streaming every step to `console`, and reports the outcome.
pub async fn execute<C, D>(
    chain: &ChainOrchestrator<C, D>,
    credential: &Credential,
    request: AnalysisRequest,
    console: &ConsoleSink,
    cancel: &CancellationToken,
) -> CommandResult
where
    C: CompletionClient,
    D: DocumentSource,
{
    let json = console.is_json();
    match chain.run(credential, request, console, cancel).await {
        Ok(AnalysisOutcome::Chain { results }) => {
            let message = format!("value proposition optimized in {} steps", results.len());
            if json {
                CommandResult::success(COMMAND, message)
            } else {
                CommandResult::text(message)
            }
        }
        Ok(AnalysisOutcome::Document { company_name, dataset, table }) => {
            console.write_table(&company_name, &dataset, &table);
            let message = format!(
                "{company_name} answered from reference dataset `{}` ({} rows)",
                dataset.display(),
                table.len()
            );
            if json {
                CommandResult::success(COMMAND, message)
            } else {
                CommandResult::text(message)
            }
        }
        Err(error) => CommandResult::from_error(COMMAND, &error, json),
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;
    use valprop_agent::{ChainOrchestrator, ScriptedCompletionClient};
    use valprop_core::{AnalysisRequest, CompanyRouter, Credential, RemoteError, Table};
    use valprop_docs::InMemoryDocumentSource;

    use super::execute;
    use crate::commands::console::tests::SharedBuffer;
    use crate::commands::console::ConsoleSink;
    use crate::commands::{EXIT_MISSING_INPUT, EXIT_REMOTE_CALL};

    const DATASET: &str = "documents/angels.xlsx";

    fn chain(
        client: ScriptedCompletionClient,
    ) -> ChainOrchestrator<ScriptedCompletionClient, InMemoryDocumentSource> {
        let table = Table::new(vec!["Name".to_string()], vec![vec!["Ada".to_string()]]);
        ChainOrchestrator::new(
            client,
            InMemoryDocumentSource::with_table(DATASET, table),
            CompanyRouter::with_special_case_dataset(DATASET),
        )
    }

    fn request(company_name: &str) -> AnalysisRequest {
        AnalysisRequest::new(company_name, "Food", "Fresh pasta kits", "Meal kits for families.")
    }

    #[tokio::test]
    async fn streams_eight_labeled_blocks_then_reports_success() {
        let buffer = SharedBuffer::default();
        let console = ConsoleSink::new(false, buffer.clone());

        let result = execute(
            &chain(ScriptedCompletionClient::new()),
            &Credential::new("sk-test"),
            request("Pastaio"),
            &console,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "value proposition optimized in 8 steps");
        let output = buffer.contents();
        assert_eq!(output.matches("## Step ").count(), 8);
        let first = output.find("## Step 0:");
        let last = output.find("## Step 7: New Optimized Value Proposition");
        assert!(first.is_some() && first < last);
    }

    #[tokio::test]
    async fn json_mode_emits_step_lines_and_an_outcome_payload() {
        let buffer = SharedBuffer::default();
        let console = ConsoleSink::new(true, buffer.clone());

        let result = execute(
            &chain(ScriptedCompletionClient::new()),
            &Credential::new("sk-test"),
            request("Pastaio"),
            &console,
            &CancellationToken::new(),
        )
        .await;

        let payload: serde_json::Value =
            serde_json::from_str(&result.output).expect("outcome is JSON");
        assert_eq!(payload["command"], "optimize");
        assert_eq!(payload["status"], "ok");
        assert_eq!(buffer.contents().lines().count(), 8);
    }

    #[tokio::test]
    async fn alias_prints_the_dataset_instead_of_calling_the_model() {
        let client = ScriptedCompletionClient::new();
        let buffer = SharedBuffer::default();
        let console = ConsoleSink::new(false, buffer.clone());

        let result = execute(
            &chain(client.clone()),
            &Credential::new("sk-test"),
            request("Quitini"),
            &console,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(client.call_count(), 0);
        assert!(buffer.contents().contains("Name\nAda"));
    }

    #[tokio::test]
    async fn missing_key_is_reported_with_a_hint() {
        let console = ConsoleSink::new(false, SharedBuffer::default());

        let result = execute(
            &chain(ScriptedCompletionClient::new()),
            &Credential::new(""),
            request("Pastaio"),
            &console,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, EXIT_MISSING_INPUT);
        assert!(result.output.contains("missing api_key"));
    }

    #[tokio::test]
    async fn failing_step_keeps_earlier_output_and_maps_the_exit_code() {
        let buffer = SharedBuffer::default();
        let console = ConsoleSink::new(false, buffer.clone());
        let client = ScriptedCompletionClient::new()
            .failing_at(5, RemoteError::Api { status: 500, message: "boom".to_string() });

        let result = execute(
            &chain(client),
            &Credential::new("sk-test"),
            request("Pastaio"),
            &console,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.exit_code, EXIT_REMOTE_CALL);
        assert!(result.output.starts_with("error: remote call failed at step 5"));
        assert_eq!(buffer.contents().matches("## Step ").count(), 5);
    }
}

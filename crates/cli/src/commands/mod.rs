pub mod ask;
pub mod config;
pub mod console;
pub mod doctor;
pub mod optimize;
pub mod welcome;

use std::path::PathBuf;

use serde::Serialize;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use valprop_core::config::{AppConfig, LoadOptions};
use valprop_core::OptimizerError;

pub const EXIT_CONFIG_VALIDATION: u8 = 2;
pub const EXIT_RUNTIME_INIT: u8 = 3;
pub const EXIT_MISSING_INPUT: u8 = 4;
pub const EXIT_DOCUMENT_LOOKUP: u8 = 5;
pub const EXIT_AUTHENTICATION: u8 = 6;
pub const EXIT_REMOTE_CALL: u8 = 7;
pub const EXIT_RUN_NOT_COMPLETED: u8 = 8;
pub const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Reports an optimizer failure as a JSON outcome or as a human-readable error with a hint.
    pub fn from_error(command: &str, error: &OptimizerError, json_output: bool) -> Self {
        let exit_code = exit_code_for(error);
        if json_output {
            return Self::failure(command, error.error_class(), error.to_string(), exit_code);
        }

        let hint = error.corrective_action().user_message();
        Self { exit_code, output: format!("error: {error}\nhint: {hint}") }
    }
}

pub fn exit_code_for(error: &OptimizerError) -> u8 {
    match error {
        OptimizerError::MissingInput { .. } => EXIT_MISSING_INPUT,
        OptimizerError::DocumentLookupFailed { .. } => EXIT_DOCUMENT_LOOKUP,
        OptimizerError::AuthenticationFailed { .. } => EXIT_AUTHENTICATION,
        OptimizerError::RemoteCallFailed { .. } | OptimizerError::AssistantCallFailed { .. } => {
            EXIT_REMOTE_CALL
        }
        OptimizerError::RunNotCompleted { .. } => EXIT_RUN_NOT_COMPLETED,
        OptimizerError::Cancelled => EXIT_CANCELLED,
    }
}

pub(crate) fn load_config(
    command: &str,
    path: Option<PathBuf>,
) -> Result<AppConfig, CommandResult> {
    let require_file = path.is_some();
    AppConfig::load(LoadOptions { config_path: path, require_file, ..LoadOptions::default() })
        .map_err(|error| {
            CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG_VALIDATION,
            )
        })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME_INIT,
        )
    })
}

/// Cancels `cancel` when the process receives Ctrl-C.
pub(crate) async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!(event_name = "cli.interrupted", "interrupt received, cancelling");
        cancel.cancel();
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

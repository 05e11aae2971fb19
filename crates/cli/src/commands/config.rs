use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use valprop_core::config::{resolve_config_path, AppConfig};

use crate::commands::{load_config, CommandResult};
use crate::API_KEY_ENV;

const COMMAND: &str = "config";

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match load_config(COMMAND, config_path.clone()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let file_path = resolve_config_path(config_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, file_doc.as_ref(), file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_values(&config) {
        let origin = source(field.key_path, field.env_keys);
        lines.push(render_line(field.key_path, &field.value, origin));
    }

    let api_key = env::var(API_KEY_ENV).map(|token| redact_token(&token));
    let api_key_source = match api_key {
        Ok(_) => format!("env ({API_KEY_ENV})"),
        Err(_) => "--api-key flag".to_string(),
    };
    lines.push(render_line(
        "credential.api_key",
        api_key.as_deref().unwrap_or("<unset>"),
        api_key_source,
    ));

    CommandResult::text(lines.join("\n"))
}

struct ConfigField {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl ConfigField {
    fn new(key_path: &'static str, value: String, env_keys: &'static [&'static str]) -> Self {
        Self { key_path, value, env_keys }
    }
}

fn effective_values(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        ConfigField::new("llm.base_url", config.llm.base_url.clone(), &["VALPROP_LLM_BASE_URL"]),
        ConfigField::new("llm.model", config.llm.model.clone(), &["VALPROP_LLM_MODEL"]),
        ConfigField::new(
            "llm.temperature",
            config.llm.temperature.to_string(),
            &["VALPROP_LLM_TEMPERATURE"],
        ),
        ConfigField::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["VALPROP_LLM_TIMEOUT_SECS"],
        ),
        ConfigField::new(
            "assistant.assistant_id",
            config.assistant.assistant_id.clone(),
            &["VALPROP_ASSISTANT_ID"],
        ),
        ConfigField::new(
            "assistant.poll_interval_ms",
            config.assistant.poll_interval_ms.to_string(),
            &["VALPROP_ASSISTANT_POLL_INTERVAL_MS"],
        ),
        ConfigField::new(
            "assistant.max_polls",
            config.assistant.max_polls.to_string(),
            &["VALPROP_ASSISTANT_MAX_POLLS"],
        ),
        ConfigField::new(
            "chain.carry_forward_analysis",
            config.chain.carry_forward_analysis.to_string(),
            &["VALPROP_CHAIN_CARRY_FORWARD_ANALYSIS"],
        ),
        ConfigField::new(
            "documents.special_case_dataset",
            config.documents.special_case_dataset.display().to_string(),
            &["VALPROP_DOCUMENTS_SPECIAL_CASE_DATASET"],
        ),
        ConfigField::new(
            "logging.level",
            config.logging.level.clone(),
            &["VALPROP_LOGGING_LEVEL", "VALPROP_LOG_LEVEL"],
        ),
        ConfigField::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["VALPROP_LOGGING_FORMAT", "VALPROP_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::polling::PollPolicy;

pub const DEFAULT_ASSISTANT_ID: &str = "asst_AhcbZwpExG3a7ui7oUPfLUtx";
pub const DEFAULT_SPECIAL_CASE_DATASET: &str = "documents/Top 500 active Business Angels EU .xlsx";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub assistant: AssistantConfig,
    pub chain: ChainConfig,
    pub documents: DocumentsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub assistant_id: String,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub carry_forward_analysis: bool,
}

#[derive(Clone, Debug)]
pub struct DocumentsConfig {
    pub special_case_dataset: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub assistant_id: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
    pub carry_forward_analysis: Option<bool>,
    pub special_case_dataset: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                temperature: 0.7,
                timeout_secs: 120,
            },
            assistant: AssistantConfig {
                assistant_id: DEFAULT_ASSISTANT_ID.to_string(),
                poll_interval_ms: 3_000,
                max_polls: 200,
            },
            chain: ChainConfig { carry_forward_analysis: false },
            documents: DocumentsConfig {
                special_case_dataset: PathBuf::from(DEFAULT_SPECIAL_CASE_DATASET),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AssistantConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("valprop.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(assistant_id) = assistant.assistant_id {
                self.assistant.assistant_id = assistant_id;
            }
            if let Some(poll_interval_ms) = assistant.poll_interval_ms {
                self.assistant.poll_interval_ms = poll_interval_ms;
            }
            if let Some(max_polls) = assistant.max_polls {
                self.assistant.max_polls = max_polls;
            }
        }

        if let Some(chain) = patch.chain {
            if let Some(carry_forward_analysis) = chain.carry_forward_analysis {
                self.chain.carry_forward_analysis = carry_forward_analysis;
            }
        }

        if let Some(documents) = patch.documents {
            if let Some(special_case_dataset) = documents.special_case_dataset {
                self.documents.special_case_dataset = special_case_dataset;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("VALPROP_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("VALPROP_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("VALPROP_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("VALPROP_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("VALPROP_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("VALPROP_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VALPROP_ASSISTANT_ID") {
            self.assistant.assistant_id = value;
        }
        if let Some(value) = read_env("VALPROP_ASSISTANT_POLL_INTERVAL_MS") {
            self.assistant.poll_interval_ms =
                parse_u64("VALPROP_ASSISTANT_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = read_env("VALPROP_ASSISTANT_MAX_POLLS") {
            self.assistant.max_polls = parse_u32("VALPROP_ASSISTANT_MAX_POLLS", &value)?;
        }

        if let Some(value) = read_env("VALPROP_CHAIN_CARRY_FORWARD_ANALYSIS") {
            self.chain.carry_forward_analysis =
                parse_bool("VALPROP_CHAIN_CARRY_FORWARD_ANALYSIS", &value)?;
        }

        if let Some(value) = read_env("VALPROP_DOCUMENTS_SPECIAL_CASE_DATASET") {
            self.documents.special_case_dataset = PathBuf::from(value);
        }

        let log_level = read_env("VALPROP_LOGGING_LEVEL").or_else(|| read_env("VALPROP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VALPROP_LOGGING_FORMAT").or_else(|| read_env("VALPROP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(assistant_id) = overrides.assistant_id {
            self.assistant.assistant_id = assistant_id;
        }
        if let Some(poll_interval_ms) = overrides.poll_interval_ms {
            self.assistant.poll_interval_ms = poll_interval_ms;
        }
        if let Some(max_polls) = overrides.max_polls {
            self.assistant.max_polls = max_polls;
        }
        if let Some(carry_forward_analysis) = overrides.carry_forward_analysis {
            self.chain.carry_forward_analysis = carry_forward_analysis;
        }
        if let Some(special_case_dataset) = overrides.special_case_dataset {
            self.documents.special_case_dataset = special_case_dataset;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_assistant(&self.assistant)?;
        validate_documents(&self.documents)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("valprop.toml"), PathBuf::from("config/valprop.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if !assistant.assistant_id.starts_with("asst_") {
        return Err(ConfigError::Validation(
            "assistant.assistant_id must start with `asst_`".to_string(),
        ));
    }

    if assistant.poll_interval_ms == 0 || assistant.poll_interval_ms > 60_000 {
        return Err(ConfigError::Validation(
            "assistant.poll_interval_ms must be in range 1..=60000".to_string(),
        ));
    }

    if assistant.max_polls == 0 {
        return Err(ConfigError::Validation(
            "assistant.max_polls must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_documents(documents: &DocumentsConfig) -> Result<(), ConfigError> {
    if documents.special_case_dataset.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "documents.special_case_dataset must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    assistant: Option<AssistantPatch>,
    chain: Option<ChainPatch>,
    documents: Option<DocumentsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    assistant_id: Option<String>,
    poll_interval_ms: Option<u64>,
    max_polls: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ChainPatch {
    carry_forward_analysis: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    special_case_dataset: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

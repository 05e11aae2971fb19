use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use secrecy::ExposeSecret;
use serde_json::Value;
use valprop_cli::commands::ask::AskArgs;
use valprop_cli::commands::optimize::OptimizeArgs;
use valprop_cli::commands::{ask, config, doctor, optimize, welcome};
use valprop_cli::resolve_api_key;
use valprop_core::AnalysisRequest;

#[test]
fn welcome_is_plain_text() {
    let result = welcome::run();
    assert_eq!(result.exit_code, 0);
    assert!(result.output.starts_with("Welcome to Our Application"));
}

#[test]
fn config_reports_defaults_and_env_sources() {
    with_env(&[("VALPROP_LLM_MODEL", "gpt-4o-mini")], || {
        let result = config::run(None);
        assert_eq!(result.exit_code, 0);

        assert!(result
            .output
            .contains("- llm.model = gpt-4o-mini (source: env (VALPROP_LLM_MODEL))"));
        assert!(result.output.contains("- llm.temperature = 0.7 (source: default)"));
        let assistant_line =
            "- assistant.assistant_id = asst_AhcbZwpExG3a7ui7oUPfLUtx (source: default)";
        assert!(result.output.contains(assistant_line));
        assert!(result.output.contains("- credential.api_key = <unset>"));
    });
}

#[test]
fn config_attributes_values_to_an_explicit_file() {
    with_env(&[], || {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("valprop.toml");
        fs::write(&path, "[assistant]\nmax_polls = 12\n\n[chain]\ncarry_forward_analysis = true\n")
            .expect("write config");

        let result = config::run(Some(path.clone()));
        assert_eq!(result.exit_code, 0);

        let expected_source = format!("(source: file ({}))", path.display());
        assert!(result.output.contains(&format!("- assistant.max_polls = 12 {expected_source}")));
        assert!(result
            .output
            .contains(&format!("- chain.carry_forward_analysis = true {expected_source}")));
    });
}

#[test]
fn config_redacts_the_api_key() {
    with_env(&[("VALPROP_API_KEY", "sk-live-0123456789")], || {
        let result = config::run(None);
        assert_eq!(result.exit_code, 0);

        assert!(result
            .output
            .contains("- credential.api_key = sk-*** (source: env (VALPROP_API_KEY))"));
        assert!(!result.output.contains("0123456789"));
    });
}

#[test]
fn config_returns_validation_failure_for_bad_env() {
    with_env(&[("VALPROP_ASSISTANT_MAX_POLLS", "0")], || {
        let result = config::run(None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn optimize_rejects_incomplete_input_without_calling_out() {
    with_env(&[("VALPROP_LLM_BASE_URL", "http://127.0.0.1:9")], || {
        let result = optimize::run(OptimizeArgs {
            request: AnalysisRequest::new("Acme", "", "Faster invoices", ""),
            api_key: None,
            json: true,
            config_path: None,
        });
        assert_eq!(result.exit_code, 4, "expected missing input exit code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "optimize");
        assert_eq!(payload["error_class"], "missing_input");
        assert_eq!(
            payload["message"],
            "incomplete input: missing industry, venture_summary, api_key"
        );
    });
}

#[test]
fn optimize_fails_fast_on_invalid_config() {
    with_env(&[("VALPROP_LLM_TEMPERATURE", "hot")], || {
        let result = optimize::run(OptimizeArgs::default());
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ask_rejects_an_empty_question() {
    with_env(&[("VALPROP_LLM_BASE_URL", "http://127.0.0.1:9")], || {
        let result = ask::run(AskArgs {
            question: "  ".to_string(),
            api_key: resolve_api_key(Some("sk-test".to_string())),
            json: true,
            config_path: None,
        });
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["error_class"], "missing_input");
        assert_eq!(payload["message"], "incomplete input: missing question");
    });
}

#[test]
fn doctor_skips_an_absent_dataset() {
    with_env(&[], || {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let missing = dir.path().join("angels.xlsx");
        env::set_var("VALPROP_DOCUMENTS_SPECIAL_CASE_DATASET", &missing);

        let result = doctor::run(true, None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(check_status(&payload, "dataset_readability"), "skipped");
        assert_eq!(check_status(&payload, "credential_presence"), "skipped");
    });
}

#[test]
fn doctor_fails_on_an_unreadable_dataset() {
    with_env(&[], || {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let corrupt = dir.path().join("angels.xlsx");
        fs::write(&corrupt, b"not a workbook").expect("write dataset");
        env::set_var("VALPROP_DOCUMENTS_SPECIAL_CASE_DATASET", &corrupt);

        let result = doctor::run(true, None);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(check_status(&payload, "dataset_readability"), "fail");
    });
}

#[test]
fn doctor_skips_dataset_check_when_config_is_invalid() {
    with_env(&[("VALPROP_LLM_BASE_URL", "ftp://example.com")], || {
        let result = doctor::run(false, None);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] dataset_readability:"));
    });
}

#[test]
fn api_key_flag_wins_over_environment() {
    with_env(&[("VALPROP_API_KEY", "sk-from-env")], || {
        let flag = resolve_api_key(Some("sk-from-flag".to_string())).expect("flag key");
        assert_eq!(flag.expose_secret(), "sk-from-flag");

        let fallback = resolve_api_key(None).expect("env key");
        assert_eq!(fallback.expose_secret(), "sk-from-env");
    });
}

fn check_status(payload: &Value, name: &str) -> String {
    payload["checks"]
        .as_array()
        .expect("checks array")
        .iter()
        .find(|check| check["name"] == name)
        .and_then(|check| check["status"].as_str())
        .expect("check present")
        .to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "VALPROP_API_KEY",
        "VALPROP_LLM_BASE_URL",
        "VALPROP_LLM_MODEL",
        "VALPROP_LLM_TEMPERATURE",
        "VALPROP_LLM_TIMEOUT_SECS",
        "VALPROP_ASSISTANT_ID",
        "VALPROP_ASSISTANT_POLL_INTERVAL_MS",
        "VALPROP_ASSISTANT_MAX_POLLS",
        "VALPROP_CHAIN_CARRY_FORWARD_ANALYSIS",
        "VALPROP_DOCUMENTS_SPECIAL_CASE_DATASET",
        "VALPROP_LOGGING_LEVEL",
        "VALPROP_LOGGING_FORMAT",
        "VALPROP_LOG_LEVEL",
        "VALPROP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

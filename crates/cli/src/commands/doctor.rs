use std::env;
use std::path::PathBuf;

use serde::Serialize;
use valprop_core::config::{AppConfig, LoadOptions};
use valprop_core::{DocumentError, DocumentSource};
use valprop_docs::SpreadsheetSource;

use crate::commands::CommandResult;
use crate::API_KEY_ENV;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, config_path: Option<PathBuf>) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\
                 \"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(config_path: Option<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();
    let require_file = config_path.is_some();

    match AppConfig::load(LoadOptions { config_path, require_file, ..LoadOptions::default() }) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_dataset(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "dataset_readability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }
    checks.push(check_credential());

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_dataset(config: &AppConfig) -> DoctorCheck {
    let dataset = &config.documents.special_case_dataset;
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "dataset_readability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    match runtime.block_on(SpreadsheetSource::new().load_table(dataset)) {
        Ok(table) => DoctorCheck {
            name: "dataset_readability",
            status: CheckStatus::Pass,
            details: format!(
                "loaded {} rows x {} columns from `{}`",
                table.len(),
                table.columns.len(),
                dataset.display()
            ),
        },
        Err(DocumentError::NotFound(path)) => DoctorCheck {
            name: "dataset_readability",
            status: CheckStatus::Skipped,
            details: format!("`{}` is absent; only special-case companies need it", path.display()),
        },
        Err(error) => DoctorCheck {
            name: "dataset_readability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_credential() -> DoctorCheck {
    let present = env::var(API_KEY_ENV).map(|token| !token.trim().is_empty()).unwrap_or(false);
    if present {
        DoctorCheck {
            name: "credential_presence",
            status: CheckStatus::Pass,
            details: format!("{API_KEY_ENV} is set"),
        }
    } else {
        DoctorCheck {
            name: "credential_presence",
            status: CheckStatus::Skipped,
            details: format!("{API_KEY_ENV} is not set; pass --api-key per command"),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

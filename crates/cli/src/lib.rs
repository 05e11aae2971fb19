pub mod commands;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use valprop_core::config::{AppConfig, LoadOptions, LogFormat};
use valprop_core::AnalysisRequest;

use crate::commands::ask::AskArgs;
use crate::commands::optimize::OptimizeArgs;

/// Environment variable consulted when `--api-key` is not given.
pub const API_KEY_ENV: &str = "VALPROP_API_KEY";

#[derive(Debug, Parser)]
#[command(
    name = "valprop",
    about = "Value proposition optimizer CLI",
    long_about = "Optimize a company's value proposition through an eight-step model chain, \
                  or ask the hosted assistant a question.",
    after_help = "Examples:\n  \
                  valprop optimize --company Acme --industry Retail \\\n    \
                  --value-proposition \"...\" --venture-summary \"...\"\n  \
                  valprop ask --question \"Which angels invest in fintech?\"\n  \
                  valprop doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Show the welcome page")]
    Welcome,
    #[command(about = "Run the eight-step value proposition chain and stream every step")]
    Optimize {
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        industry: String,
        #[arg(long, default_value = "")]
        value_proposition: String,
        #[arg(long, default_value = "")]
        venture_summary: String,
        #[arg(long, help = "API key; falls back to VALPROP_API_KEY")]
        api_key: Option<String>,
        #[arg(long, help = "Emit one JSON line per step and a JSON outcome")]
        json: bool,
    },
    #[command(about = "Ask the hosted assistant one question on a fresh thread")]
    Ask {
        #[arg(long, default_value = "")]
        question: String,
        #[arg(long, help = "API key; falls back to VALPROP_API_KEY")]
        api_key: Option<String>,
        #[arg(long, help = "Emit a JSON outcome")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, reference dataset and credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = init_logging(cli.config.clone()) {
        eprintln!("warning: {error:#}");
    }

    let result = match cli.command {
        None | Some(Command::Welcome) => commands::welcome::run(),
        Some(Command::Optimize {
            company,
            industry,
            value_proposition,
            venture_summary,
            api_key,
            json,
        }) => commands::optimize::run(OptimizeArgs {
            request: AnalysisRequest::new(company, industry, value_proposition, venture_summary),
            api_key: resolve_api_key(api_key),
            json,
            config_path: cli.config,
        }),
        Some(Command::Ask { question, api_key, json }) => commands::ask::run(AskArgs {
            question,
            api_key: resolve_api_key(api_key),
            json,
            config_path: cli.config,
        }),
        Some(Command::Config) => commands::config::run(cli.config),
        Some(Command::Doctor { json }) => commands::doctor::run(json, cli.config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Prefers the flag, then the environment. The value is wrapped before anything else sees it.
pub fn resolve_api_key(flag: Option<String>) -> Option<SecretString> {
    flag.or_else(|| env::var(API_KEY_ENV).ok()).map(SecretString::from)
}

fn init_logging(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    use tracing::Level;

    let require_file = config_path.is_some();
    let config =
        AppConfig::load(LoadOptions { config_path, require_file, ..LoadOptions::default() })
            .unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow::anyhow!(error)).context("failed to install log subscriber")
}

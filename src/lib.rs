pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod query;
pub mod report;
pub mod session;
pub mod workflow;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();

    // Logs go to stderr so report output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::AppConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    tracing::debug!(
        api = %config.api_base_url,
        data_dir = %config.data_dir.display(),
        "{} v{}",
        config::APP_NAME,
        config::APP_VERSION
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Cannot start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::dispatch(cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

//! Yaseen CLI
//!
//! Main entry point for the yaseen command-line tool.
//! Answers questions from the indexed corpus with citations and a
//! confidence score, or defers when the corpus has nothing relevant.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ConfigCommand, StatsCommand};
use std::path::PathBuf;
use std::process::ExitCode;
use yaseen_core::{logging, AppError, ErrorKind, Settings};

/// Yaseen - cited answers about Islamic texts
#[derive(Parser, Debug)]
#[command(name = "yaseen")]
#[command(about = "Cited, confidence-gated answers about Islamic texts", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML settings file
    #[arg(short, long, global = true, env = "YASEEN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable debug mode (sets log level to debug)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question
    Ask(AskCommand),

    /// Describe the configured vector index
    Stats(StatsCommand),

    /// Print the resolved settings (secrets redacted)
    Config(ConfigCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Stats(_) => "stats",
            Commands::Config(_) => "config",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).map(|s| {
        s.with_overrides(cli.log_level.clone(), cli.debug, cli.no_color, cli.json_logs)
    });

    // Settings may have failed to load; fall back to the flags alone.
    let (log_level, no_color, json_logs) = match &settings {
        Ok(s) => (s.effective_log_level(), s.no_color, s.json_logs),
        Err(_) => (
            cli.log_level
                .clone()
                .or_else(|| cli.debug.then(|| "debug".to_string())),
            cli.no_color,
            cli.json_logs,
        ),
    };

    if let Err(e) = logging::init_logging(log_level.as_deref(), no_color, json_logs) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let result = run(cli, settings).await;

    match result {
        Ok(()) => {
            tracing::info!("Command completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

async fn run(cli: Cli, settings: yaseen_core::AppResult<Settings>) -> anyhow::Result<()> {
    let settings = settings.context("Failed to load settings")?;

    tracing::info!("Yaseen CLI starting");
    tracing::debug!("Index: {}", settings.index_name);
    tracing::debug!("Generation model: {}", settings.generation.model);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // Route to command handlers
    match cli.command {
        Commands::Ask(cmd) => cmd.execute(&settings).await,
        Commands::Stats(cmd) => cmd.execute(&settings).await,
        Commands::Config(cmd) => cmd.execute(&settings),
    }
}

/// Print the caller-safe message as JSON and pick the exit code.
///
/// Exit code 2 means the request was refused; 1 means we failed.
fn report(error: &anyhow::Error) -> ExitCode {
    let (message, code) = match error.downcast_ref::<AppError>() {
        Some(app_error) => {
            let code = match app_error.kind() {
                ErrorKind::Client => 2,
                ErrorKind::Server => 1,
            };
            (app_error.user_message(), code)
        }
        None => (yaseen_core::error::GENERIC_FAILURE_MESSAGE.to_string(), 1),
    };

    if code == 2 {
        tracing::info!("Command rejected: {:#}", error);
    } else {
        tracing::error!("Command failed: {:#}", error);
    }

    println!("{}", serde_json::json!({ "error": message }));
    ExitCode::from(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["yaseen", "ask", "Who is Allah?", "--top-k", "3"]).unwrap();
        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.query, "Who is Allah?");
                assert_eq!(cmd.top_k, Some(3));
                assert!(!cmd.pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["yaseen", "stats", "--debug", "--json-logs"]).unwrap();
        assert!(cli.debug);
        assert!(cli.json_logs);
        assert_eq!(cli.command.name(), "stats");
    }

    #[test]
    fn test_ask_requires_query() {
        assert!(Cli::try_parse_from(["yaseen", "ask"]).is_err());
    }

    #[test]
    fn test_report_exit_codes() {
        let client = anyhow::Error::new(AppError::Validation("too short".to_string()));
        assert_eq!(report(&client), ExitCode::from(2));

        let server = anyhow::Error::new(AppError::Generation("boom".to_string()))
            .context("Failed to answer");
        assert_eq!(report(&server), ExitCode::from(1));

        let other = anyhow::anyhow!("unexpected");
        assert_eq!(report(&other), ExitCode::from(1));
    }
}

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{self, EnvFilter};

use unfollower::config::{is_valid_log_level, Config};
use unfollower::console::TerminalConsole;
use unfollower::error::{ExitStatus, UnfollowerError};
use unfollower::github::GitHubClient;
use unfollower::session::{RunReport, Session};

#[derive(Parser)]
#[command(name = "unfollower")]
#[command(about = "Finds GitHub accounts you follow that don't follow you back and unfollows them")]
#[command(version)]
struct Cli {
    /// Path to configuration file (can also be set via UNFOLLOWER_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable verbose logging (equivalent to --log-level debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Get config path from CLI arg or UNFOLLOWER_CONFIG environment variable
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var("UNFOLLOWER_CONFIG").ok().map(PathBuf::from))
    }

    /// CLI flags win over the configured level
    fn log_level(&self, config: &Config) -> String {
        if self.verbose {
            "debug".to_string()
        } else if let Some(ref level) = self.log_level {
            level.clone()
        } else {
            config.logging().level.unwrap_or_else(|| "warn".to_string())
        }
    }
}

/// Logs go to stderr; prompts and messages use stdout.
fn init_logging(log_level: &str) -> Result<(), UnfollowerError> {
    if !is_valid_log_level(log_level) {
        return Err(UnfollowerError::InvalidData(format!(
            "Invalid log level: {log_level}. Valid levels are: error, warn, info, debug, trace"
        )));
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.to_lowercase()))
        .map_err(|e| UnfollowerError::InvalidData(format!("Failed to create log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    debug!("Logging initialized with level: {}", log_level);
    Ok(())
}

async fn run_application(config: Config) -> Result<RunReport, UnfollowerError> {
    let mut console = TerminalConsole::new();
    let github = config.github;
    info!("GitHub API: {}", github.api_url);

    Session::new(&mut console)
        .run(|credential| GitHubClient::new(github, credential))
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitStatus::Failure.into();
        }
    };

    if let Err(e) = init_logging(&cli.log_level(&config)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitStatus::Failure.into();
    }

    info!("Starting unfollower v{}", env!("CARGO_PKG_VERSION"));

    match run_application(config).await {
        Ok(report) => {
            let status = report.exit_status();
            info!(
                "Run finished: {:?}, unfollowed {}, failed {}",
                report.outcome,
                report.tally.unfollowed_count(),
                report.tally.failed.len()
            );
            status.into()
        }
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            ExitStatus::from(&e).into()
        }
    }
}

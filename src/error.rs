use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnfollowerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("GitHub API error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("Terminal interaction failed: {0}")]
    Prompt(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),}

impl From<dialoguer::Error> for UnfollowerError {
    fn from(error: dialoguer::Error) -> Self {
        UnfollowerError::Prompt(error.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitHubError {
    #[error("401 Unauthorized")]
    Unauthorized,

    #[error("403 Forbidden: {0}")]
    Forbidden(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response status {status}")]
    UnexpectedStatus { status: u16 },
}

impl GitHubError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => GitHubError::Unauthorized,
            403 => GitHubError::Forbidden(summarize_body(body)),
            _ => GitHubError::Transport(format!("HTTP {status}: {}", summarize_body(body))),
        }
    }

    /// Human-readable explanation shown to the user alongside the error.
    pub fn user_hint(&self) -> &'static str {
        match self {
            GitHubError::Unauthorized => "Please check your Personal Access Token.",
            GitHubError::Forbidden(_) => {
                "Your token may not have the 'user:follow' scope, or you may have hit a rate limit."
            }
            GitHubError::Transport(_) => "Check your network connection and the configured API URL.",
            GitHubError::UnexpectedStatus { .. } => {
                "GitHub did not confirm the change; the relationship may be unchanged."
            }
        }
    }
}

/// GitHub error bodies are JSON with a `message` field; fall back to the raw text.
fn summarize_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Process exit codes. User aborts are run outcomes, not errors, so they
/// never reach the `UnfollowerError` mapping below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    FetchFailed = 1,
    Aborted = 2,
    Failure = 3,
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}

impl From<&UnfollowerError> for ExitStatus {
    fn from(error: &UnfollowerError) -> Self {
        match error {
            UnfollowerError::GitHub(_) => ExitStatus::FetchFailed,
            _ => ExitStatus::Failure,
        }
    }
}

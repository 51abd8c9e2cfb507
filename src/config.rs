use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const MAX_PER_PAGE: u32 = 100;
const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_per_page() -> u32 {
    MAX_PER_PAGE
}

fn default_user_agent() -> String {
    format!("unfollower/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    pub logging: Option<LoggingConfig>,
}

/// Transport settings for the GitHub REST API. Credentials are deliberately
/// absent: the subject and token are only ever collected interactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout; `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            per_page: default_per_page(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Some("warn".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply environment overrides.
    /// A missing file is not an error; defaults are used instead.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = match config_path {
            Some(path) => path,
            None => Self::find_config_file(),
        };

        let mut config = if config_file.exists() {
            tracing::debug!("Loading config from: {}", config_file.display());
            let content = std::fs::read_to_string(&config_file)?;
            toml::from_str::<Config>(&content)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_file.display()
            );
            Config::default()
        };

        config.apply_env_overrides()?;

        if config.logging.is_none() {
            config.logging = Some(LoggingConfig::default());
        }

        config.validate()?;

        Ok(config)
    }

    /// `./unfollower.toml`, then `$XDG_CONFIG_HOME/unfollower/unfollower.toml`
    /// (or the platform config dir). Falls back to the current-directory path.
    fn find_config_file() -> PathBuf {
        let current_dir_config = PathBuf::from("unfollower.toml");
        if current_dir_config.exists() {
            return current_dir_config;
        }

        let config_home = env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(dirs::config_dir);

        if let Some(home) = config_home {
            let xdg_config = home.join("unfollower").join("unfollower.toml");
            if xdg_config.exists() {
                return xdg_config;
            }
        }

        current_dir_config
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(api_url) = env::var("UNFOLLOWER_API_URL") {
            self.github.api_url = api_url;
        }
        if let Ok(per_page) = env::var("UNFOLLOWER_PER_PAGE") {
            self.github.per_page = per_page.parse().map_err(|_| {
                ConfigError::InvalidValue("UNFOLLOWER_PER_PAGE must be a valid number".to_string())
            })?;
        }
        if let Ok(user_agent) = env::var("UNFOLLOWER_USER_AGENT") {
            self.github.user_agent = user_agent;
        }
        if let Ok(timeout) = env::var("UNFOLLOWER_TIMEOUT_SECS") {
            self.github.timeout_secs = Some(timeout.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "UNFOLLOWER_TIMEOUT_SECS must be a valid number".to_string(),
                )
            })?);
        }
        if let Ok(level) = env::var("UNFOLLOWER_LOG_LEVEL") {
            let logging = self.logging.get_or_insert_with(LoggingConfig::default);
            logging.level = Some(level);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.github.api_url).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "github.api_url '{}' is not a valid URL: {e}",
                self.github.api_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "github.api_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.github.per_page == 0 || self.github.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidValue(format!(
                "github.per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }

        if self.github.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "github.user_agent must not be empty".to_string(),
            ));
        }

        if self.github.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "github.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            if !is_valid_log_level(level) {
                return Err(ConfigError::InvalidValue(format!(
                    "logging.level '{level}' is invalid. Valid levels are: {}",
                    VALID_LOG_LEVELS.join(", ")
                )));
            }
        }

        Ok(())
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

pub fn is_valid_log_level(level: &str) -> bool {
    VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 5] = [
        "UNFOLLOWER_API_URL",
        "UNFOLLOWER_PER_PAGE",
        "UNFOLLOWER_USER_AGENT",
        "UNFOLLOWER_TIMEOUT_SECS",
        "UNFOLLOWER_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_config_defaults() {
        let github = GitHubConfig::default();
        assert_eq!(github.api_url, "https://api.github.com");
        assert_eq!(github.per_page, 100);
        assert!(github.user_agent.starts_with("unfollower/"));
        assert_eq!(github.timeout_secs, None);

        let logging = LoggingConfig::default();
        assert_eq!(logging.level, Some("warn".to_string()));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml"))).unwrap();

        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.logging().level, Some("warn".to_string()));
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unfollower.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[github]
api_url = "https://github.example.com/api/v3"
per_page = 50
timeout_secs = 20

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.github.api_url, "https://github.example.com/api/v3");
        assert_eq!(config.github.per_page, 50);
        assert_eq!(config.github.timeout_secs, Some(20));
        assert!(config.github.user_agent.starts_with("unfollower/"));
        assert_eq!(config.logging().level, Some("debug".to_string()));
    }

    #[test]
    fn test_env_var_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("UNFOLLOWER_API_URL", "http://localhost:9999");
        env::set_var("UNFOLLOWER_PER_PAGE", "25");
        env::set_var("UNFOLLOWER_TIMEOUT_SECS", "5");
        env::set_var("UNFOLLOWER_LOG_LEVEL", "trace");

        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        clear_env();

        assert_eq!(config.github.api_url, "http://localhost:9999");
        assert_eq!(config.github.per_page, 25);
        assert_eq!(config.github.timeout_secs, Some(5));
        assert_eq!(config.logging().level, Some("trace".to_string()));
    }

    #[test]
    fn test_env_var_invalid_number() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("UNFOLLOWER_PER_PAGE", "lots");
        let mut config = Config::default();
        let result = config.apply_env_overrides();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.github.per_page = 0;
        assert!(config.validate().unwrap_err().to_string().contains("per_page"));

        let mut config = Config::default();
        config.github.per_page = 101;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.github.api_url = "not a url".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("api_url"));

        let mut config = Config::default();
        config.github.api_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.github.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging = Some(LoggingConfig {
            level: Some("loud".to_string()),
        });
        assert!(config.validate().unwrap_err().to_string().contains("loud"));
    }

    #[test]
    fn test_toml_parsing_partial_sections() {
        let config: Config = toml::from_str("[github]\nper_page = 10\n").unwrap();
        assert_eq!(config.github.per_page, 10);
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert!(config.logging.is_none());

        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.github.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_is_valid_log_level() {
        assert!(is_valid_log_level("info"));
        assert!(is_valid_log_level("DEBUG"));
        assert!(!is_valid_log_level("verbose"));
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, error};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins (comma separated)
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory with the editor's static assets
    pub static_dir: Option<PathBuf>,

    /// Backing file of the shared document
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,

    /// Root of the per-session build workspaces
    #[serde(default = "default_sandbox_dir")]
    pub sandbox_dir: PathBuf,

    /// Maximum number of concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Operations allowed per session per 60 second window
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Maximum document length, in characters
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,

    /// Number of applied operations kept for position transformation
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    // Sandbox toolchain
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default = "default_compiler_flags")]
    pub compiler_flags: Vec<String>,
    #[serde(default = "default_timeout_program")]
    pub timeout_program: String,

    // Sandbox limits
    #[serde(default = "default_build_timeout_secs")]
    pub build_timeout_secs: u64,
    #[serde(default = "default_build_guard_secs")]
    pub build_guard_secs: u64,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    #[serde(default = "default_run_guard_secs")]
    pub run_guard_secs: u64,
    #[serde(default = "default_build_output_limit")]
    pub build_output_limit: usize,
    #[serde(default = "default_run_output_limit")]
    pub run_output_limit: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed list of allowed CORS origins, empty when CORS is disabled.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn build_guard(&self) -> Duration {
        Duration::from_secs(self.build_guard_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn run_guard(&self) -> Duration {
        Duration::from_secs(self.run_guard_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            static_dir: None,
            document_path: default_document_path(),
            sandbox_dir: default_sandbox_dir(),
            max_sessions: default_max_sessions(),
            rate_limit: default_rate_limit(),
            max_content_size: default_max_content_size(),
            history_cap: default_history_cap(),
            compiler: default_compiler(),
            compiler_flags: default_compiler_flags(),
            timeout_program: default_timeout_program(),
            build_timeout_secs: default_build_timeout_secs(),
            build_guard_secs: default_build_guard_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            run_guard_secs: default_run_guard_secs(),
            build_output_limit: default_build_output_limit(),
            run_output_limit: default_run_output_limit(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_document_path() -> PathBuf {
    PathBuf::from("hello.c")
}

fn default_sandbox_dir() -> PathBuf {
    PathBuf::from("sandbox")
}

fn default_max_sessions() -> usize {
    50
}

fn default_rate_limit() -> u32 {
    30
}

fn default_max_content_size() -> usize {
    100_000
}

fn default_history_cap() -> usize {
    1000
}

fn default_compiler() -> String {
    "gcc".to_string()
}

fn default_compiler_flags() -> Vec<String> {
    vec!["-Wall".to_string(), "-Wextra".to_string(), "-Wpedantic".to_string()]
}

fn default_timeout_program() -> String {
    "timeout".to_string()
}

fn default_build_timeout_secs() -> u64 {
    10
}

fn default_build_guard_secs() -> u64 {
    15
}

fn default_run_timeout_secs() -> u64 {
    5
}

fn default_run_guard_secs() -> u64 {
    8
}

fn default_build_output_limit() -> usize {
    1024 * 1024
}

fn default_run_output_limit() -> usize {
    64 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_hard_timeouts_below_guards() {
        let config = Config::default();
        assert!(config.build_timeout() < config.build_guard());
        assert!(config.run_timeout() < config.run_guard());
        assert!(config.run_output_limit < config.build_output_limit);
        assert_eq!(config.server_address(), "0.0.0.0:8082");
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config {
            cors_origins: Some("http://a.test, http://b.test,,".to_string()),
            ..Config::default()
        };
        assert_eq!(config.cors_origin_list(), vec!["http://a.test", "http://b.test"]);
        assert!(Config::default().cors_origin_list().is_empty());
    }
}

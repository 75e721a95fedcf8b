//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/legalchat/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/legalchat/` (~/.config/legalchat/)
//! - State/Logs: `$XDG_STATE_HOME/legalchat/` (~/.local/state/legalchat/)

use crate::error::{Error, Result};
use crate::types::AgentType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Assistant backend endpoints
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat defaults
    #[serde(default)]
    pub chat: ChatConfig,

    /// Knowledge panel defaults
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Streaming channel reconnection policy
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Assistant backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL for REST calls (e.g., `http://localhost:8000`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for the streaming channel. Derived from `api_url` when unset.
    pub ws_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Fixed user id. A fresh one is generated per launch when unset.
    pub user_id: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: None,
            timeout_secs: default_timeout(),
            user_id: None,
        }
    }
}

impl BackendConfig {
    /// REST base URL without a trailing slash.
    pub fn api_base(&self) -> String {
        self.api_url.trim_end_matches('/').to_string()
    }

    /// Streaming base URL without a trailing slash.
    ///
    /// Falls back to `api_url` with `http` swapped for `ws` (and `https` for `wss`).
    pub fn ws_base(&self) -> String {
        match &self.ws_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let api = self.api_base();
                if let Some(rest) = api.strip_prefix("https://") {
                    format!("wss://{}", rest)
                } else if let Some(rest) = api.strip_prefix("http://") {
                    format!("ws://{}", rest)
                } else {
                    api
                }
            }
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Chat defaults
#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Agent persona selected at startup
    #[serde(default)]
    pub default_agent: AgentType,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_agent: AgentType::Team,
        }
    }
}

/// Knowledge search and upload defaults
#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    /// Maximum number of search results
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Minimum similarity score for search results (0.0 - 1.0)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Category sent with uploads when none is given
    #[serde(default = "default_category")]
    pub default_category: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            similarity_threshold: default_similarity_threshold(),
            default_category: default_category(),
        }
    }
}

fn default_search_limit() -> u32 {
    5
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_category() -> String {
    "general".to_string()
}

/// Streaming channel reconnection policy
#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectConfig {
    /// Reconnect automatically after the channel drops
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay before the first reconnect attempt
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound on the delay between attempts
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Consecutive failures before giving up (0 = never give up)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Random spread applied to each delay, as a fraction (0.0 - 1.0)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
            jitter: default_jitter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_jitter() -> f64 {
    0.2
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// Only parses. Callers apply their overrides and then call
    /// [`validate`](Self::validate).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        toml::from_str(&content).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let api = &self.backend.api_url;
        if !(api.starts_with("http://") || api.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend.api_url must start with http:// or https://, got {}",
                api
            )));
        }
        if let Some(ws) = &self.backend.ws_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(Error::Config(format!(
                    "backend.ws_url must start with ws:// or wss://, got {}",
                    ws
                )));
            }
        }
        if self.knowledge.search_limit == 0 {
            return Err(Error::Config(
                "knowledge.search_limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.knowledge.similarity_threshold) {
            return Err(Error::Config(
                "knowledge.similarity_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.reconnect.jitter) {
            return Err(Error::Config(
                "reconnect.jitter must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/legalchat/config.toml` (~/.config/legalchat/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("legalchat").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/legalchat/` (~/.local/state/legalchat/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("legalchat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.api_url, "http://localhost:8000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.chat.default_agent, AgentType::Team);
        assert_eq!(config.knowledge.search_limit, 5);
        assert_eq!(config.knowledge.default_category, "general");
        assert!(config.reconnect.enabled);
        assert_eq!(config.reconnect.max_attempts, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[backend]
api_url = "https://legal.example.com/"
user_id = "user_42"

[chat]
default_agent = "contract_analyzer"

[knowledge]
search_limit = 10
similarity_threshold = 0.5

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.backend.api_base(), "https://legal.example.com");
        assert_eq!(config.backend.user_id.as_deref(), Some("user_42"));
        assert_eq!(config.chat.default_agent, AgentType::ContractAnalyzer);
        assert_eq!(config.knowledge.search_limit, 10);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(config.reconnect.initial_delay_ms, 500);
    }

    #[test]
    fn test_ws_base_derivation() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.ws_base(), "ws://localhost:8000");

        backend.api_url = "https://legal.example.com/".to_string();
        assert_eq!(backend.ws_base(), "wss://legal.example.com");

        backend.ws_url = Some("ws://stream.example.com:9000/".to_string());
        assert_eq!(backend.ws_base(), "ws://stream.example.com:9000");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.backend.api_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.ws_url = Some("http://localhost:8000".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.knowledge.similarity_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.knowledge.search_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reconnect.jitter = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend]\napi_url = \"http://10.0.0.5:8000\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.backend.api_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_load_from_leaves_validation_to_caller() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend]\napi_url = \"localhost:8000\"").unwrap();

        let mut config = Config::load_from(file.path()).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        // An override can still repair the file value
        config.backend.api_url = "http://localhost:8000".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[knowledge\nsearch_limit = ").unwrap();

        assert!(matches!(
            Config::load_from(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_unknown_agent_rejected() {
        let toml = "[chat]\ndefault_agent = \"judge\"\n";
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}

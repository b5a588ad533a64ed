//! Configuration management for conduit
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/conduit/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{ConduitError, Result};

/// Main configuration for conduit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model service configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Turn loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Tool host launch configuration
    #[serde(default)]
    pub host: HostConfig,
    /// Transcript configuration
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

/// OpenAI-compatible model service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the chat completions API
    pub base_url: String,
    /// API key, read from OPENAI_API_KEY and never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Turn loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum model calls within one user turn
    /// Default: 10
    pub max_turns: usize,
    /// Per tool call timeout in seconds, none to wait forever
    /// Default: 120
    pub tool_timeout_secs: Option<u64>,
    /// Stream model responses and print text as it arrives
    pub streaming: bool,
    /// System prompt sent ahead of the conversation
    pub system_prompt: Option<String>,
}

/// How tool host scripts are launched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Interpreter for `.py` launch targets
    pub python: String,
    /// Interpreter for `.js` launch targets
    pub node: String,
}

/// Session transcript configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Whether to duplicate output into a transcript file
    pub enabled: bool,
    /// Parent directory for timestamped run directories
    pub dir: PathBuf,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            model: env::var("CONDUIT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            tool_timeout_secs: Some(120),
            streaming: env::var("CONDUIT_STREAMING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            system_prompt: None,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            python: env::var("CONDUIT_PYTHON").unwrap_or_else(|_| "python".to_string()),
            node: "node".to_string(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("client_runs"),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("conduit")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(ConduitError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| ConduitError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// The API key always comes from the environment.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| ConduitError::config(format!("Failed to parse config: {}", e)))?;
        config.llm.api_key = env::var("OPENAI_API_KEY").ok();
        Ok(config)
    }

    /// Per tool call timeout, if any
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.agent.tool_timeout_secs.map(Duration::from_secs)
    }
}

//! Configuration for triagent.
//!
//! Everything is loaded once at startup; missing credentials are a fatal
//! configuration error here, never a per-turn failure.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Main configuration for the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub data: DataConfig,
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            llm: LlmConfig::from_env()?,
            data: DataConfig::from_env()?,
            server: ServerConfig::from_env()?,
            engine: EngineConfig::from_env()?,
        })
    }
}

/// Whether text generation calls a live endpoint or is switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmMode {
    #[default]
    Live,
    /// No outbound calls; drafting uses its deterministic fallbacks.
    Disabled,
}

impl std::str::FromStr for LlmMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            _ => Err(format!("invalid LLM mode '{s}', expected 'live' or 'disabled'")),
        }
    }
}

/// Text-generation provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub mode: LlmMode,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    /// Maximum number of retries for transient errors.
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl LlmConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mode: LlmMode = optional_env("TRIAGENT_LLM_MODE")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "TRIAGENT_LLM_MODE".to_string(),
                message: e,
            })?
            .unwrap_or_default();

        let api_key = optional_env("LLM_API_KEY")?
            .or(optional_env("OPENAI_API_KEY")?)
            .map(SecretString::from);

        if mode == LlmMode::Live && api_key.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "LLM_API_KEY".to_string(),
                hint: "Set LLM_API_KEY (or OPENAI_API_KEY), or run with TRIAGENT_LLM_MODE=disabled"
                    .to_string(),
            });
        }

        let max_retries = optional_env("LLM_MAX_RETRIES")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "LLM_MAX_RETRIES".to_string(),
                message: format!("must be a non-negative integer: {e}"),
            })?
            .unwrap_or(3);

        let timeout_secs = optional_env("LLM_TIMEOUT_SECS")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "LLM_TIMEOUT_SECS".to_string(),
                message: format!("must be a positive integer: {e}"),
            })?
            .unwrap_or(60);

        Ok(Self {
            mode,
            base_url: optional_env("LLM_BASE_URL")?
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key,
            model: optional_env("LLM_MODEL")?.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            max_retries,
            timeout_secs,
        })
    }
}

/// Where the static data tables live.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_dir: PathBuf,
}

impl DataConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            data_dir: optional_env("TRIAGENT_DATA_DIR")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
        })
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bind = optional_env("TRIAGENT_BIND")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "TRIAGENT_BIND".to_string(),
                message: format!("must be a socket address like 127.0.0.1:8080: {e}"),
            })?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

        Ok(Self { bind })
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Defensive bound on steps executed within a single turn.
    pub max_steps_per_turn: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: 16,
        }
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_steps_per_turn = optional_env("TRIAGENT_MAX_STEPS_PER_TURN")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "TRIAGENT_MAX_STEPS_PER_TURN".to_string(),
                message: format!("must be a positive integer: {e}"),
            })?
            .unwrap_or(16);

        if max_steps_per_turn == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRIAGENT_MAX_STEPS_PER_TURN".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self { max_steps_per_turn })
    }
}

/// Read an env var, treating empty values as unset.
fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

//! Configuration management for flowhand
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/flowhand/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::error::{FlowError, Result};

/// Main configuration for flowhand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Capability provider configuration
    #[serde(default)]
    pub capability: CapabilityConfig,
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Ollama server configuration (local models)
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Where the browser runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Browser launched on this machine
    Local,
    /// Browser reached over a CDP endpoint
    Remote,
}

impl FromStr for Environment {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "remote" | "browserbase" => Ok(Environment::Remote),
            other => Err(FlowError::config(format!(
                "Unknown environment '{}', expected local or remote",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Remote => write!(f, "remote"),
        }
    }
}

/// Capability provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Session environment target
    pub environment: Environment,
    /// Model used to resolve act/extract instructions
    /// Default: google/gemini-2.5-flash-preview-05-20
    pub model: String,
    /// API key for hosted models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Log verbosity (0 warn, 1 info, 2+ debug)
    pub verbosity: u8,
    /// Request timeout for hosted model calls, in seconds
    pub timeout_secs: u64,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Default timeout for browser operations in ms
    pub timeout_ms: u64,
    /// CDP endpoint used when the environment is remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdp_url: Option<String>,
    /// Planning attempts per act/extract before giving up
    pub act_attempts: u32,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| v == "true" || v == "1")
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            model: env::var("FLOWHAND_MODEL")
                .unwrap_or_else(|_| "google/gemini-2.5-flash-preview-05-20".to_string()),
            api_key: env::var("FLOWHAND_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            verbosity: env::var("FLOWHAND_VERBOSE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            timeout_secs: 120,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            session_name: env::var("FLOWHAND_BROWSER_SESSION")
                .unwrap_or_else(|_| "flowhand".to_string()),
            headed: env_flag("FLOWHAND_BROWSER_HEADED").unwrap_or(false),
            timeout_ms: 30000,
            cdp_url: env::var("FLOWHAND_CDP_URL").ok().filter(|u| !u.is_empty()),
            act_attempts: 2,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowhand")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    ///
    /// A missing config file falls back to defaults. A file that exists but
    /// cannot be read or parsed, or an invalid environment value, is an error.
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::load_from_path(&Self::config_file())?.with_env_overrides(|key| env::var(key).ok())
    }

    /// Load configuration from `path`, or defaults when the file does not exist
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(FlowError::config(format!(
                    "Failed to read config {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FlowError::config(format!("Failed to parse config: {}", e)))
    }

    /// Environment variables win over values read from the config file
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(environment) = lookup("FLOWHAND_ENV") {
            self.capability.environment = environment.parse()?;
        }
        if let Some(model) = lookup("FLOWHAND_MODEL") {
            self.capability.model = model;
        }
        if self.capability.api_key.is_none() {
            self.capability.api_key = lookup("FLOWHAND_API_KEY")
                .or_else(|| lookup("GOOGLE_API_KEY"))
                .filter(|k| !k.is_empty());
        }
        if let Some(verbosity) = lookup("FLOWHAND_VERBOSE") {
            self.capability.verbosity = verbosity.parse().map_err(|_| {
                FlowError::config(format!(
                    "FLOWHAND_VERBOSE must be a number, got '{}'",
                    verbosity
                ))
            })?;
        }
        if let Some(cdp) = lookup("FLOWHAND_CDP_URL") {
            self.browser.cdp_url = Some(cdp).filter(|u| !u.is_empty());
        }
        if let Some(headed) = lookup("FLOWHAND_BROWSER_HEADED") {
            self.browser.headed = headed == "true" || headed == "1";
        }
        Ok(self)
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Generate a config file content for display, without secrets
    pub fn to_display_toml(&self) -> String {
        let mut redacted = self.clone();
        if redacted.capability.api_key.is_some() {
            redacted.capability.api_key = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&redacted)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

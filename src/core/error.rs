//! Custom error types for flowhand
//!
//! Provides a unified error handling system across all modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for flowhand operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// Workflow definition or configuration problems, raised before any step runs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session could not load the requested target
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// A described UI action could not be resolved or performed
    #[error("Action error: {0}")]
    Action(String),

    /// Extracted data could not be shaped to the schema
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The browser session could not be opened
    #[error("Session error: {0}")]
    Session(String),

    /// The browser session could not be closed cleanly
    #[error("Session teardown error: {0}")]
    SessionTeardown(String),

    /// agent-browser command failures
    #[error("Browser error: {0}")]
    Browser(String),

    /// Language model provider errors
    #[error("Model provider error: {0}")]
    Provider(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for flowhand operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Serializable classification of a [`FlowError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Navigation,
    Action,
    Extraction,
    Session,
    SessionTeardown,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Navigation => "NavigationError",
            ErrorKind::Action => "ActionError",
            ErrorKind::Extraction => "ExtractionError",
            ErrorKind::Session => "SessionError",
            ErrorKind::SessionTeardown => "SessionTeardownError",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

impl FlowError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a navigation error
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    /// Create an action error
    pub fn action(msg: impl Into<String>) -> Self {
        Self::Action(msg.into())
    }

    /// Create an extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Configuration(_) => ErrorKind::Configuration,
            FlowError::Navigation(_) => ErrorKind::Navigation,
            FlowError::Action(_) => ErrorKind::Action,
            FlowError::Extraction(_) => ErrorKind::Extraction,
            FlowError::Session(_) | FlowError::AgentBrowserNotFound => ErrorKind::Session,
            FlowError::SessionTeardown(_) => ErrorKind::SessionTeardown,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether this error is one a single step may fail with
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Navigation | ErrorKind::Action | ErrorKind::Extraction
        )
    }
}

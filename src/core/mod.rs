//! Core module - shared infrastructure for flowhand
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::{BrowserConfig, CapabilityConfig, Config, Environment, OllamaConfig};
pub use error::{ErrorKind, FlowError, Result};
pub use types::*;

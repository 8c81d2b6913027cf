//! LLM Provider implementations and factory
//!
//! Model identifiers select the backend: `google/<model>` or `gemini-*` go to
//! Gemini, `ollama/<model>` or any other name goes to the local Ollama server.

pub mod gemini;

use std::sync::Arc;

use crate::core::{Config, FlowError, Result};
use crate::llm::traits::LLMProvider;
use crate::llm::OllamaClient;

use self::gemini::GeminiProvider;

/// Which backend serves a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
    Gemini,
}

/// A parsed model identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: ProviderType,
    /// Model name as the backend expects it
    pub model: String,
}

impl ModelSpec {
    pub fn parse(identifier: &str) -> Result<Self> {
        let identifier = identifier.trim();
        let (provider, model) = match identifier.split_once('/') {
            Some(("google", model)) | Some(("gemini", model)) => (ProviderType::Gemini, model),
            Some(("ollama", model)) => (ProviderType::Ollama, model),
            _ if identifier.starts_with("gemini-") => (ProviderType::Gemini, identifier),
            _ => (ProviderType::Ollama, identifier),
        };

        if model.is_empty() {
            return Err(FlowError::config(format!(
                "Invalid model identifier '{}'",
                identifier
            )));
        }

        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }
}

/// Create a new LLM provider for the configured model
pub fn create_provider(config: &Config) -> Result<(Arc<dyn LLMProvider>, ModelSpec)> {
    let spec = ModelSpec::parse(&config.capability.model)?;
    let provider: Arc<dyn LLMProvider> = match spec.provider {
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
        ProviderType::Gemini => Arc::new(GeminiProvider::from_config(config)?),
    };
    Ok((provider, spec))
}

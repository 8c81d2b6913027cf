//! LLM module - Language Model integrations
//!
//! Resolves natural-language act and extract instructions for the browser
//! backend, with Ollama for local models and Gemini for hosted ones.

pub mod ollama;
pub mod provider;
pub mod traits;

pub use ollama::OllamaClient;
pub use provider::{create_provider, ModelSpec, ProviderType};
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

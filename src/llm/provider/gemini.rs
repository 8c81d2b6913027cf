//! Google Gemini provider
//!
//! Calls the Generative Language API with an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::core::{Config, FlowError, Message, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiProvider {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.capability.api_key.clone().ok_or_else(|| {
            FlowError::config("Gemini models need an API key (set FLOWHAND_API_KEY or GOOGLE_API_KEY)")
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.capability.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the provider at a different API root
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_body(messages: &[Message], options: Option<&GenerateOptions>) -> Value {
        let system: Vec<Value> = messages
            .iter()
            .filter(|m| m.is_system())
            .map(|m| json!({ "text": m.content }))
            .collect();

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| !m.is_system())
            .map(|m| {
                json!({
                    "role": if m.role == "user" { "user" } else { "model" },
                    "parts": [{ "text": m.content }]
                })
            })
            .collect();

        let mut generation_config = json!({ "candidateCount": 1 });
        if let Some(opts) = options {
            if let Some(t) = opts.temperature {
                generation_config["temperature"] = json!(t);
            }
            if let Some(max) = opts.max_tokens {
                generation_config["maxOutputTokens"] = json!(max);
            }
            if opts.json {
                generation_config["responseMimeType"] = json!("application/json");
            }
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": system });
        }
        body
    }

    fn parse_response(model: &str, response: &Value) -> Result<LLMResponse> {
        let content = response["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| FlowError::provider("Failed to parse Gemini response content"))?
            .to_string();

        let usage = response.get("usageMetadata").map(|u| TokenUsage {
            prompt_tokens: u["promptTokenCount"].as_u64().unwrap_or(0) as u32,
            completion_tokens: u["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
            total_tokens: u["totalTokenCount"].as_u64().unwrap_or(0) as u32,
        });

        Ok(LLMResponse {
            content,
            usage,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        let body = Self::build_body(messages, options.as_ref());
        debug!(model, "Gemini request: {}", body);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(FlowError::provider(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: Value = resp.json().await?;
        Self::parse_response(model, &response_json)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let mut config = Config::default();
        config.capability.api_key = None;
        assert!(matches!(
            GeminiProvider::from_config(&config),
            Err(FlowError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_body_splits_system() {
        let messages = vec![Message::system("be terse"), Message::user("hello")];
        let body = GeminiProvider::build_body(&messages, Some(&GenerateOptions::json()));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_parse_response() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"action\":\"none\"}" }] } }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10 }
        });
        let parsed = GeminiProvider::parse_response("gemini-2.0-flash", &response).unwrap();
        assert_eq!(parsed.content, "{\"action\":\"none\"}");
        assert_eq!(parsed.usage.unwrap().total_tokens, 10);

        assert!(GeminiProvider::parse_response("m", &json!({})).is_err());
    }
}

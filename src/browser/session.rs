//! agent-browser sessions with model-resolved act and extract
//!
//! Each act takes an interactive snapshot, asks the model for one action and
//! performs it. Each extract takes a full snapshot and asks the model for JSON
//! shaped by the step's schema. Both are retried with a fresh snapshot up to
//! `browser.act_attempts` times; retries live here, not in the executor.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::browser::cli::BrowserCli;
use crate::browser::planner::{self, ActionKind, ActionPlan};
use crate::capability::{BrowserSession, SessionFactory};
use crate::core::{Config, Environment, FlowError, Message, Result};
use crate::llm::{create_provider, GenerateOptions, LLMProvider};
use crate::workflow::{ExtractSchema, ExtractionResult};

/// Opens agent-browser sessions
pub struct AgentBrowserFactory {
    cli: BrowserCli,
    environment: Environment,
    llm: Arc<dyn LLMProvider>,
    model: String,
    attempts: u32,
}

impl AgentBrowserFactory {
    /// Build a factory from configuration, creating the model provider too
    pub fn from_config(config: &Config) -> Result<Self> {
        let (llm, spec) = create_provider(config)?;
        Self::with_provider(config, llm, spec.model)
    }

    /// Build a factory around an existing model provider
    pub fn with_provider(
        config: &Config,
        llm: Arc<dyn LLMProvider>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let environment = config.capability.environment;
        let mut cli = BrowserCli::from_config(&config.browser);

        if environment == Environment::Remote {
            let cdp_url = config.browser.cdp_url.clone().ok_or_else(|| {
                FlowError::config("Remote environment needs browser.cdp_url (or FLOWHAND_CDP_URL)")
            })?;
            cli.set_cdp_url(Some(cdp_url));
        }

        Ok(Self {
            cli,
            environment,
            llm,
            model: model.into(),
            attempts: config.browser.act_attempts.max(1),
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[async_trait]
impl SessionFactory for AgentBrowserFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        if !BrowserCli::is_available().await {
            return Err(FlowError::AgentBrowserNotFound);
        }

        let mut session = AgentBrowserSession {
            cli: self.cli.clone(),
            llm: Arc::clone(&self.llm),
            model: self.model.clone(),
            attempts: self.attempts,
            started: false,
            closed: false,
        };

        if self.environment == Environment::Remote {
            // Connecting is the only part of a remote open that can half-succeed
            session.started = true;
            if let Err(e) = session.cli.get_url().await {
                if let Err(close_err) = session.close().await {
                    debug!("Cleanup after failed connect: {}", close_err);
                }
                return Err(FlowError::session(format!(
                    "Cannot reach remote browser: {}",
                    e
                )));
            }
        }

        Ok(Box::new(session))
    }

    fn name(&self) -> &str {
        "agent-browser"
    }
}

/// One agent-browser session
pub struct AgentBrowserSession {
    cli: BrowserCli,
    llm: Arc<dyn LLMProvider>,
    model: String,
    attempts: u32,
    /// A browser may exist that needs closing
    started: bool,
    closed: bool,
}

impl AgentBrowserSession {
    async fn ask_model(&self, messages: &[Message]) -> Result<String> {
        let response = self
            .llm
            .chat(&self.model, messages, Some(GenerateOptions::json()))
            .await?;
        debug!(model = %response.model, "Model reply: {}", response.content);
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Model usage"
            );
        }
        Ok(response.content)
    }

    async fn try_act(&self, description: &str) -> Result<()> {
        let snapshot = self.cli.snapshot(true).await?;
        let messages = planner::build_act_messages(description, &snapshot);
        let reply = self.ask_model(&messages).await?;

        let plan = ActionPlan::parse(&reply)?;
        plan.validate(&snapshot)?;
        debug!(?plan, "Performing planned action");
        self.perform(&plan).await?;

        if let Err(e) = self.cli.wait_for_load().await {
            debug!("Page did not settle after action: {}", e);
        }
        Ok(())
    }

    async fn perform(&self, plan: &ActionPlan) -> Result<()> {
        let target = plan.target().unwrap_or_default();
        let value = plan.value.as_deref().unwrap_or_default();

        match plan.action {
            ActionKind::Click => self.cli.click(&target).await,
            ActionKind::Fill => self.cli.fill(&target, value).await,
            ActionKind::Select => self.cli.select(&target, value).await,
            ActionKind::Hover => self.cli.hover(&target).await,
            ActionKind::Press => self.cli.press(value).await,
            ActionKind::Scroll => {
                let direction = if value.is_empty() { "down" } else { value };
                self.cli.scroll(direction, None).await
            }
            ActionKind::None => Err(FlowError::action("Nothing to perform")),
        }
    }

    async fn try_extract(
        &self,
        instruction: &str,
        schema: &ExtractSchema,
    ) -> Result<ExtractionResult> {
        let snapshot = self.cli.snapshot(false).await?;
        let page_url = self.cli.get_url().await.ok();
        let messages =
            planner::build_extract_messages(instruction, schema, &snapshot, page_url.as_deref());
        let reply = self.ask_model(&messages).await?;

        let raw = planner::parse_json_reply(&reply)?;
        schema.coerce(raw)
    }
}

#[async_trait]
impl BrowserSession for AgentBrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| FlowError::navigation(format!("Invalid URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FlowError::navigation(format!(
                "Unsupported URL scheme '{}' in {}",
                parsed.scheme(),
                url
            )));
        }

        self.started = true;
        self.cli
            .open(parsed.as_str())
            .await
            .map_err(|e| as_navigation(e, url))?;

        if let Err(e) = self.cli.wait_for_load().await {
            debug!("Page did not reach network idle: {}", e);
        }
        Ok(())
    }

    async fn act(&mut self, description: &str) -> Result<()> {
        self.started = true;
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.try_act(description).await {
                Ok(()) => return Ok(()),
                Err(FlowError::AgentBrowserNotFound) => return Err(FlowError::AgentBrowserNotFound),
                Err(e) => {
                    warn!(attempt, max = self.attempts, "Action attempt failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(as_kind(last_error, FlowError::Action, "action"))
    }

    async fn extract(
        &mut self,
        instruction: &str,
        schema: &ExtractSchema,
    ) -> Result<ExtractionResult> {
        self.started = true;
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.try_extract(instruction, schema).await {
                Ok(result) => return Ok(result),
                Err(FlowError::AgentBrowserNotFound) => return Err(FlowError::AgentBrowserNotFound),
                Err(e) => {
                    warn!(attempt, max = self.attempts, "Extraction attempt failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(as_kind(last_error, FlowError::Extraction, "extraction"))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if !self.started {
            return Ok(());
        }
        self.cli
            .close()
            .await
            .map_err(|e| FlowError::SessionTeardown(e.to_string()))
    }
}

fn as_navigation(error: FlowError, url: &str) -> FlowError {
    match error {
        FlowError::AgentBrowserNotFound | FlowError::Navigation(_) => error,
        other => FlowError::navigation(format!("Cannot load {}: {}", url, other)),
    }
}

/// Keep the message of an already-classified error, wrap everything else
fn as_kind(
    error: Option<FlowError>,
    make: fn(String) -> FlowError,
    what: &str,
) -> FlowError {
    match error {
        Some(FlowError::Action(msg)) | Some(FlowError::Extraction(msg)) => make(msg),
        Some(other) => make(other.to_string()),
        None => make(format!("{} was never attempted", what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMResponse;

    struct NoModel;

    #[async_trait]
    impl LLMProvider for NoModel {
        async fn chat(
            &self,
            _model: &str,
            _messages: &[Message],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            Err(FlowError::provider("offline"))
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn session() -> AgentBrowserSession {
        AgentBrowserSession {
            cli: BrowserCli::new("unit"),
            llm: Arc::new(NoModel),
            model: "m".to_string(),
            attempts: 1,
            started: false,
            closed: false,
        }
    }

    #[test]
    fn test_remote_requires_cdp() {
        let mut config = Config::default();
        config.capability.environment = Environment::Remote;
        config.browser.cdp_url = None;
        let result = AgentBrowserFactory::with_provider(&config, Arc::new(NoModel), "m");
        assert!(matches!(result, Err(FlowError::Configuration(_))));

        config.browser.cdp_url = Some("ws://browser:9222".to_string());
        let factory = AgentBrowserFactory::with_provider(&config, Arc::new(NoModel), "m").unwrap();
        assert_eq!(factory.environment(), Environment::Remote);
    }

    #[tokio::test]
    async fn test_navigate_rejects_bad_urls() {
        let mut session = session();
        assert!(matches!(
            session.navigate("not a url").await,
            Err(FlowError::Navigation(_))
        ));
        assert!(matches!(
            session.navigate("file:///etc/passwd").await,
            Err(FlowError::Navigation(_))
        ));
        assert!(!session.started);
    }

    #[tokio::test]
    async fn test_close_unstarted_is_idempotent() {
        let mut session = session();
        assert!(session.close().await.is_ok());
        assert!(session.close().await.is_ok());
        assert!(session.closed);
    }

    #[test]
    fn test_as_kind_keeps_message() {
        let err = as_kind(
            Some(FlowError::action("element gone")),
            FlowError::Action,
            "action",
        );
        assert_eq!(err.to_string(), "Action error: element gone");

        let err = as_kind(
            Some(FlowError::provider("offline")),
            FlowError::Extraction,
            "extraction",
        );
        assert!(matches!(err, FlowError::Extraction(ref m) if m.contains("offline")));
    }
}

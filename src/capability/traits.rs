//! Capability provider traits
//!
//! The executor drives a browser only through these traits, so any automation
//! backend can be substituted without touching it.

use async_trait::async_trait;

use crate::core::Result;
use crate::workflow::{ExtractSchema, ExtractionResult};

/// A live browser session, exclusively owned for one run
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`. Fails with `FlowError::Navigation`.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Perform a UI action described in natural language. Fails with `FlowError::Action`.
    async fn act(&mut self, description: &str) -> Result<()>;

    /// Pull data matching `schema` off the current page. Fails with `FlowError::Extraction`.
    async fn extract(
        &mut self,
        instruction: &str,
        schema: &ExtractSchema,
    ) -> Result<ExtractionResult>;

    /// Release the session.
    ///
    /// Must be idempotent: a second call, or a call on a session whose browser
    /// never started, returns `Ok(())`.
    async fn close(&mut self) -> Result<()>;
}

/// Opens browser sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new session. Fails with `FlowError::Session`.
    ///
    /// A factory that fails partway through opening cleans up after itself.
    async fn open(&self) -> Result<Box<dyn BrowserSession>>;

    /// Get the provider name
    fn name(&self) -> &str;
}

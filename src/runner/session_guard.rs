//! Scoped ownership of a browser session for one run

use tracing::{error, info, warn};

use crate::capability::BrowserSession;
use crate::core::FlowError;

/// Owns the session until [`SessionGuard::release`] closes it exactly once
pub struct SessionGuard {
    session: Box<dyn BrowserSession>,
    released: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session,
            released: false,
        }
    }

    pub fn session_mut(&mut self) -> &mut dyn BrowserSession {
        self.session.as_mut()
    }

    /// Close the session. Teardown failures are logged and swallowed.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        info!("Closing browser session.");
        if let Err(e) = self.session.close().await {
            let teardown = FlowError::SessionTeardown(e.to_string());
            error!(error = %teardown, "Error closing browser session");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.released {
            warn!("Browser session dropped without being released");
        }
    }
}

//! agent-browser CLI wrapper
//!
//! Provides async interface to agent-browser commands.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::browser::snapshot::Snapshot;
use crate::core::{BrowserConfig, FlowError, Result};

const BINARY: &str = "agent-browser";

/// Async handle on one named agent-browser session
#[derive(Debug, Clone)]
pub struct BrowserCli {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Remote browser endpoint
    cdp_url: Option<String>,
    /// Per-command timeout
    timeout: Duration,
}

impl BrowserCli {
    /// Create a new CLI wrapper for a local browser
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            headed: false,
            cdp_url: None,
            timeout: Duration::from_millis(30000),
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            session_name: config.session_name.clone(),
            headed: config.headed,
            cdp_url: None,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Set headed mode
    pub fn set_headed(&mut self, headed: bool) {
        self.headed = headed;
    }

    /// Connect to a remote browser instead of launching one
    pub fn set_cdp_url(&mut self, cdp_url: Option<String>) {
        self.cdp_url = cdp_url;
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new(BINARY)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Flags passed before every command
    fn global_args(&self) -> Vec<String> {
        let mut args = vec!["--session".to_string(), self.session_name.clone()];
        if self.headed {
            args.push("--headed".to_string());
        }
        if let Some(cdp) = &self.cdp_url {
            args.push("--cdp".to_string());
            args.push(cdp.clone());
        }
        args
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(BINARY);
        cmd.args(self.global_args());
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(session = %self.session_name, "agent-browser {}", args.join(" "));

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                FlowError::browser(format!(
                    "agent-browser {} timed out after {}ms",
                    args.first().copied().unwrap_or(""),
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FlowError::AgentBrowserNotFound
                } else {
                    FlowError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(FlowError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }

    /// Run a command and return JSON output
    async fn run_json_command(&self, args: &[&str]) -> Result<String> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");
        self.run_command(&full_args).await
    }

    /// Navigate to a URL
    pub async fn open(&self, url: &str) -> Result<()> {
        self.run_command(&["open", url]).await.map(|_| ())
    }

    /// Wait for network idle
    pub async fn wait_for_load(&self) -> Result<()> {
        self.run_command(&["wait", "--load", "networkidle"])
            .await
            .map(|_| ())
    }

    /// Click an element by ref
    pub async fn click(&self, ref_id: &str) -> Result<()> {
        self.run_command(&["click", ref_id]).await.map(|_| ())
    }

    /// Fill an input field
    pub async fn fill(&self, ref_id: &str, text: &str) -> Result<()> {
        self.run_command(&["fill", ref_id, text]).await.map(|_| ())
    }

    /// Choose an option of a select element
    pub async fn select(&self, ref_id: &str, value: &str) -> Result<()> {
        self.run_command(&["select", ref_id, value]).await.map(|_| ())
    }

    pub async fn hover(&self, ref_id: &str) -> Result<()> {
        self.run_command(&["hover", ref_id]).await.map(|_| ())
    }

    /// Press a key
    pub async fn press(&self, key: &str) -> Result<()> {
        self.run_command(&["press", key]).await.map(|_| ())
    }

    /// Scroll the page
    pub async fn scroll(&self, direction: &str, pixels: Option<u32>) -> Result<()> {
        let mut args = vec!["scroll", direction];
        let px_str;

        if let Some(px) = pixels {
            px_str = px.to_string();
            args.push(&px_str);
        }

        self.run_command(&args).await.map(|_| ())
    }

    /// Get page snapshot
    pub async fn snapshot(&self, interactive_only: bool) -> Result<Snapshot> {
        let args = if interactive_only {
            vec!["snapshot", "-i"]
        } else {
            vec!["snapshot"]
        };

        let output = self.run_json_command(&args).await?;
        Snapshot::parse(&output)
    }

    /// Get current URL
    pub async fn get_url(&self) -> Result<String> {
        self.run_command(&["get", "url"])
            .await
            .map(|s| s.trim().to_string())
    }

    /// Close the browser
    pub async fn close(&self) -> Result<()> {
        self.run_command(&["close"]).await.map(|_| ())
    }
}

impl Default for BrowserCli {
    fn default() -> Self {
        Self::new("flowhand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_creation() {
        let cli = BrowserCli::new("test-session");
        assert_eq!(cli.session_name(), "test-session");
        assert_eq!(cli.global_args(), vec!["--session", "test-session"]);
    }

    #[test]
    fn test_global_args_remote_headed() {
        let mut cli = BrowserCli::new("shop");
        cli.set_headed(true);
        cli.set_cdp_url(Some("ws://browser:9222".to_string()));
        assert_eq!(
            cli.global_args(),
            vec!["--session", "shop", "--headed", "--cdp", "ws://browser:9222"]
        );
    }

    #[test]
    fn test_from_config_timeout() {
        let mut config = BrowserConfig::default();
        config.timeout_ms = 1500;
        config.session_name = "cfg".to_string();
        let cli = BrowserCli::from_config(&config);
        assert_eq!(cli.timeout, Duration::from_millis(1500));
        assert_eq!(cli.session_name(), "cfg");
    }
}

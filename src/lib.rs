//! flowhand - declarative browser workflow runner
//!
//! Runs an ordered list of navigate / act / extract steps against one browser
//! session and reports a single all-or-nothing result.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Workflow**: Steps, variables, extraction schemas, results
//! - **Capability**: The session traits the executor drives
//! - **Runner**: The executor and the run-once entry point
//! - **Browser**: agent-browser backed sessions
//! - **LLM**: Model providers that resolve act and extract instructions
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowhand::browser::AgentBrowserFactory;
//! use flowhand::workflow::builtin::purchase_flow;
//! use flowhand::{runner, Config};
//!
//! #[tokio::main]
//! async fn main() -> flowhand::Result<()> {
//!     let config = Config::load()?;
//!     let factory = AgentBrowserFactory::from_config(&config)?;
//!
//!     let result = runner::run_once(&purchase_flow(), Arc::new(factory)).await;
//!     println!("{}", runner::summary_line(&result));
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod capability;
pub mod core;
pub mod llm;
pub mod runner;
pub mod workflow;

// Re-export commonly used items
pub use capability::{BrowserSession, SessionFactory};
pub use core::{Config, FlowError, Result};
pub use runner::WorkflowExecutor;
pub use workflow::{Workflow, WorkflowResult, WorkflowStep};

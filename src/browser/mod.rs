//! Browser automation module
//!
//! Capability provider backed by the agent-browser CLI, with act and extract
//! instructions resolved by a language model.

mod cli;
pub mod planner;
mod session;
mod snapshot;

pub use cli::BrowserCli;
pub use planner::{ActionKind, ActionPlan};
pub use session::{AgentBrowserFactory, AgentBrowserSession};
pub use snapshot::{Element, Snapshot};

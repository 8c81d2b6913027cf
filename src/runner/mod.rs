//! Runner module - executes a workflow once and maps the outcome to a status
//!
//! Process-level side effects (printing the final line, exiting) stay in the
//! binary; everything here returns values.

pub mod executor;
pub mod session_guard;

use std::sync::Arc;

use crate::capability::SessionFactory;
use crate::workflow::{Workflow, WorkflowResult};

pub use executor::WorkflowExecutor;
pub use session_guard::SessionGuard;

/// Execute `workflow` exactly once against sessions from `factory`
pub async fn run_once(workflow: &Workflow, factory: Arc<dyn SessionFactory>) -> WorkflowResult {
    WorkflowExecutor::new(factory).run(workflow).await
}

/// Process exit status for a result: 0 on success, 1 otherwise
pub fn exit_code(result: &WorkflowResult) -> i32 {
    if result.success {
        0
    } else {
        1
    }
}

/// Final log line for a result
pub fn summary_line(result: &WorkflowResult) -> String {
    format!(
        "Execution result: {}",
        serde_json::to_string(result)
            .unwrap_or_else(|_| format!("{{\"success\":{}}}", result.success))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FlowError;
    use crate::workflow::ErrorInfo;

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(&WorkflowResult::succeeded(0, Default::default())), 0);
        let failed =
            WorkflowResult::failed(ErrorInfo::from_error(&FlowError::action("x"), Some(0)));
        assert_eq!(exit_code(&failed), 1);
    }

    #[test]
    fn test_summary_line() {
        let line = summary_line(&WorkflowResult::succeeded(2, Default::default()));
        assert_eq!(line, r#"Execution result: {"success":true,"steps_completed":2}"#);
    }
}

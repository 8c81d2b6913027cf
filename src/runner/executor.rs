//! Workflow executor
//!
//! Runs a workflow's steps in order against one session and produces a single
//! terminal [`WorkflowResult`]. The session is released on every exit path,
//! including a panic inside a step, which is re-raised after the release.

use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info};

use crate::capability::{BrowserSession, SessionFactory};
use crate::core::{ErrorKind, FlowError, Result};
use crate::runner::session_guard::SessionGuard;
use crate::workflow::{
    ErrorInfo, ExtractionResult, StepKind, Workflow, WorkflowResult, WorkflowStep,
};

/// Executes workflows through an injected session factory
pub struct WorkflowExecutor {
    factory: Arc<dyn SessionFactory>,
}

impl WorkflowExecutor {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self { factory }
    }

    /// Run every step of `workflow` once.
    ///
    /// Definition errors are reported before a session is opened. No step is
    /// retried; the first failure aborts the remaining steps.
    pub async fn run(&self, workflow: &Workflow) -> WorkflowResult {
        let steps = match workflow.resolve() {
            Ok(steps) => steps,
            Err(e) => {
                error!(workflow = workflow.label(), "Workflow definition rejected: {}", e);
                return WorkflowResult::failed(ErrorInfo::from_error(&e, None));
            }
        };

        info!(
            workflow = workflow.label(),
            provider = self.factory.name(),
            "Initializing browser session ({} steps)...",
            steps.len()
        );

        let session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => {
                let e = classify_open_error(e);
                error!("Workflow failed: {}", e);
                return WorkflowResult::failed(ErrorInfo::from_error(&e, None));
            }
        };
        info!("Browser session initialized successfully.");

        let mut guard = SessionGuard::new(session);
        let outcome = AssertUnwindSafe(run_steps(guard.session_mut(), &steps))
            .catch_unwind()
            .await;
        guard.release().await;

        match outcome {
            Ok(result) => {
                match &result.error {
                    None => info!("Workflow completed successfully"),
                    Some(info) => error!("Workflow failed: {}", info),
                }
                result
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

async fn run_steps(session: &mut dyn BrowserSession, steps: &[WorkflowStep]) -> WorkflowResult {
    let total = steps.len();
    let mut extractions = BTreeMap::new();

    for (index, step) in steps.iter().enumerate() {
        let number = index + 1;
        info!("[Step {}/{}] {}", number, total, step.describe());

        match dispatch(session, step).await {
            Ok(Some(data)) => {
                info!(
                    "[Step {}/{}] Extracted: {}",
                    number,
                    total,
                    serde_json::to_string(&data).unwrap_or_default()
                );
                extractions.insert(index, data);
            }
            Ok(None) => info!("[Step {}/{}] Completed", number, total),
            Err(e) => {
                error!("[Step {}/{}] Failed: {}", number, total, e);
                return WorkflowResult::failed(ErrorInfo::from_error(&e, Some(index)))
                    .with_progress(index, extractions);
            }
        }
    }

    WorkflowResult::succeeded(total, extractions)
}

async fn dispatch(
    session: &mut dyn BrowserSession,
    step: &WorkflowStep,
) -> Result<Option<ExtractionResult>> {
    let outcome = match step {
        WorkflowStep::Navigate { url } => session.navigate(url).await.map(|_| None),
        WorkflowStep::Act { description } => session.act(description).await.map(|_| None),
        WorkflowStep::Extract {
            instruction,
            schema,
        } => session.extract(instruction, schema).await.map(Some),
    };

    outcome.map_err(|e| classify_step_error(e, step.kind()))
}

/// Errors outside the navigation/action/extraction set take the kind of the
/// step that raised them
fn classify_step_error(error: FlowError, kind: StepKind) -> FlowError {
    if error.is_step_failure() {
        return error;
    }
    let message = error.to_string();
    match kind {
        StepKind::Navigate => FlowError::navigation(message),
        StepKind::Act => FlowError::action(message),
        StepKind::Extract => FlowError::extraction(message),
    }
}

fn classify_open_error(error: FlowError) -> FlowError {
    match error.kind() {
        ErrorKind::Configuration | ErrorKind::Session => error,
        _ => FlowError::session(error.to_string()),
    }
}

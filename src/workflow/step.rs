//! Workflow steps
//!
//! A step is plain data: the executor dispatches on its variant, so a workflow
//! can be written in a file, validated and tested without a live session.

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::workflow::schema::ExtractSchema;
use crate::workflow::variables::{self, Variables};

/// One unit of workflow work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkflowStep {
    /// Load a URL in the session
    Navigate { url: String },
    /// Perform a UI action described in natural language
    Act { description: String },
    /// Pull structured data matching a schema off the current page
    Extract {
        instruction: String,
        schema: ExtractSchema,
    },
}

/// Discriminant of a [`WorkflowStep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Navigate,
    Act,
    Extract,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Navigate => write!(f, "navigate"),
            StepKind::Act => write!(f, "act"),
            StepKind::Extract => write!(f, "extract"),
        }
    }
}

impl WorkflowStep {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate { url: url.into() }
    }

    pub fn act(description: impl Into<String>) -> Self {
        Self::Act {
            description: description.into(),
        }
    }

    pub fn extract(instruction: impl Into<String>, schema: ExtractSchema) -> Self {
        Self::Extract {
            instruction: instruction.into(),
            schema,
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            WorkflowStep::Navigate { .. } => StepKind::Navigate,
            WorkflowStep::Act { .. } => StepKind::Act,
            WorkflowStep::Extract { .. } => StepKind::Extract,
        }
    }

    /// The templated text field of this step
    pub fn text(&self) -> &str {
        match self {
            WorkflowStep::Navigate { url } => url,
            WorkflowStep::Act { description } => description,
            WorkflowStep::Extract { instruction, .. } => instruction,
        }
    }

    /// Variable names this step references
    pub fn references(&self) -> Result<Vec<&str>> {
        variables::references(self.text())
    }

    /// Check the step's own structure (schema shape)
    pub fn validate(&self) -> Result<()> {
        match self {
            WorkflowStep::Extract { schema, .. } => schema.validate(),
            _ => Ok(()),
        }
    }

    /// Copy of this step with variables substituted into its text
    pub fn resolve(&self, vars: &Variables) -> Result<WorkflowStep> {
        let text = vars.substitute(self.text())?;
        Ok(match self {
            WorkflowStep::Navigate { .. } => WorkflowStep::Navigate { url: text },
            WorkflowStep::Act { .. } => WorkflowStep::Act { description: text },
            WorkflowStep::Extract { schema, .. } => WorkflowStep::Extract {
                instruction: text,
                schema: schema.clone(),
            },
        })
    }

    /// Human-readable progress line for this step
    pub fn describe(&self) -> String {
        match self {
            WorkflowStep::Navigate { url } => format!("Navigating to: {}", url),
            WorkflowStep::Act { description } => format!("Performing action: {}", description),
            WorkflowStep::Extract { instruction, .. } => format!("Extracting: {}", instruction),
        }
    }
}

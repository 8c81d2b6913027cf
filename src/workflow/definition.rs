//! Workflow definitions: ordered steps plus variables
//!
//! Definitions are loaded from TOML or JSON files, or built in code.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::{FlowError, Result};
use crate::workflow::step::WorkflowStep;
use crate::workflow::variables::Variables;

/// An immutable, ordered sequence of steps and the variables they reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name, value);
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Load a definition, choosing the format from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FlowError::config(format!("Failed to read workflow {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(FlowError::config(format!(
                "Unsupported workflow format '{}', expected .toml or .json",
                other.unwrap_or("")
            ))),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FlowError::config(format!("Failed to parse workflow: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| FlowError::config(format!("Failed to parse workflow: {}", e)))
    }

    /// Label used in log lines
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else {
            self.id.as_deref().unwrap_or("workflow")
        }
    }

    /// Check schemas and variable references without producing resolved steps
    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    /// Validate every step and substitute variables into all of them.
    ///
    /// This is all-or-nothing: the first definition error is returned and no
    /// resolved steps are produced.
    pub fn resolve(&self) -> Result<Vec<WorkflowStep>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                step.validate()
                    .and_then(|_| step.resolve(&self.variables))
                    .map_err(|e| match e {
                        FlowError::Configuration(msg) => {
                            FlowError::config(format!("Step {}: {}", index + 1, msg))
                        }
                        other => other,
                    })
            })
            .collect()
    }
}

//! Run outcomes: extraction results and the terminal workflow result

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::core::{ErrorKind, FlowError};

/// Structured data returned by an extract step, shaped by its schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult(Map<String, Value>);

impl ExtractionResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Get a field value by name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a collection field as a slice of records
    pub fn records(&self, field: &str) -> Option<&[Value]> {
        self.0
            .get(field)
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Error payload of a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    /// Zero-based index of the failing step, if a step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl ErrorInfo {
    pub fn from_error(error: &FlowError, step: Option<usize>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            step,
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            Some(step) => write!(f, "{} at step {}: {}", self.kind, step + 1, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Terminal result of one workflow run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Number of steps that completed before the run ended
    pub steps_completed: usize,
    /// Extract step results keyed by zero-based step index
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extractions: BTreeMap<usize, ExtractionResult>,
}

impl WorkflowResult {
    pub fn succeeded(
        steps_completed: usize,
        extractions: BTreeMap<usize, ExtractionResult>,
    ) -> Self {
        Self {
            success: true,
            error: None,
            steps_completed,
            extractions,
        }
    }

    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::default()
        }
    }

    /// Attach progress made before a failure
    pub fn with_progress(
        mut self,
        steps_completed: usize,
        extractions: BTreeMap<usize, ExtractionResult>,
    ) -> Self {
        self.steps_completed = steps_completed;
        self.extractions = extractions;
        self
    }

    /// Extraction recorded for the step at `index`
    pub fn extraction(&self, index: usize) -> Option<&ExtractionResult> {
        self.extractions.get(&index)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_serialization() {
        let result = WorkflowResult::failed(ErrorInfo::from_error(
            &FlowError::action("element not found"),
            Some(1),
        ));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["kind"], json!("action"));
        assert_eq!(value["error"]["step"], json!(1));
        assert!(value.get("extractions").is_none());
    }

    #[test]
    fn test_error_info_display() {
        let info = ErrorInfo::from_error(&FlowError::navigation("unreachable"), Some(0));
        assert_eq!(
            info.to_string(),
            "NavigationError at step 1: Navigation error: unreachable"
        );
    }

    #[test]
    fn test_extraction_lookup() {
        let mut map = Map::new();
        map.insert("products".into(), json!([{"name": "a"}, {"name": "b"}]));
        let mut extractions = BTreeMap::new();
        extractions.insert(3, ExtractionResult::new(map));

        let result = WorkflowResult::succeeded(4, extractions);
        assert_eq!(result.extraction(3).unwrap().records("products").unwrap().len(), 2);
        assert!(result.extraction(0).is_none());
    }
}

//! Snapshot parsing for agent-browser output
//!
//! Parses the accessibility tree JSON from agent-browser.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::{FlowError, Result};

/// Parsed snapshot from agent-browser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Whether the operation succeeded
    #[serde(default)]
    pub success: bool,
    /// Snapshot data
    #[serde(default)]
    pub data: Option<SnapshotData>,
}

/// Snapshot data content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    /// Raw snapshot string (accessibility tree)
    #[serde(default)]
    pub snapshot: String,
    /// Element refs mapped to their info
    #[serde(default)]
    pub refs: HashMap<String, Element>,
}

/// An element in the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Element {
    /// ARIA role
    #[serde(default)]
    pub role: String,
    /// Accessible name
    #[serde(default)]
    pub name: String,
    /// Element value (for inputs)
    #[serde(default)]
    pub value: Option<String>,
    /// Whether element is focused
    #[serde(default)]
    pub focused: bool,
    /// Additional properties
    #[serde(flatten)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Snapshot {
    /// Parse `snapshot --json` output
    pub fn parse(output: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(output.trim())
            .map_err(|e| FlowError::browser(format!("Unreadable page snapshot: {}", e)))?;
        if !snapshot.success {
            return Err(FlowError::browser("agent-browser reported a failed snapshot"));
        }
        Ok(snapshot)
    }

    /// Get an element by ref
    pub fn get_element(&self, ref_id: &str) -> Option<&Element> {
        // Remove @ prefix if present
        let clean_ref = ref_id.strip_prefix('@').unwrap_or(ref_id);
        self.data.as_ref().and_then(|d| d.refs.get(clean_ref))
    }

    /// Elements ordered by ref (e1, e2, ..., e10)
    pub fn ordered_elements(&self) -> Vec<(&String, &Element)> {
        let mut elements: Vec<(&String, &Element)> = self
            .data
            .as_ref()
            .map(|d| d.refs.iter().collect())
            .unwrap_or_default();
        elements.sort_by_key(|(ref_id, _)| ref_sort_key(ref_id));
        elements
    }

    /// Get the raw accessibility tree string
    pub fn raw_tree(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.snapshot.as_str())
    }

    /// Format snapshot for display
    pub fn format_for_display(&self) -> String {
        if self.data.is_none() {
            return "No snapshot data available".to_string();
        }

        let mut output = String::new();
        output.push_str("Page Elements:\n");

        for (ref_id, element) in self.ordered_elements() {
            let value_str = element
                .value
                .as_ref()
                .map(|v| format!(" = \"{}\"", v))
                .unwrap_or_default();

            output.push_str(&format!(
                "  @{}: {} \"{}\"{}",
                ref_id, element.role, element.name, value_str
            ));

            if element.focused {
                output.push_str(" [focused]");
            }

            output.push('\n');
        }

        output
    }
}

fn ref_sort_key(ref_id: &str) -> (u64, String) {
    let digits: String = ref_id.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.parse().unwrap_or(u64::MAX), ref_id.to_string())
}

//! Model-driven planning for act and extract
//!
//! Turns a natural-language instruction plus a page snapshot into a prompt,
//! and turns the model's JSON reply back into a concrete browser action or
//! raw extraction data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::snapshot::Snapshot;
use crate::core::{FlowError, Message, Result};
use crate::workflow::ExtractSchema;

/// Longest accessibility tree sent in an extraction prompt
const MAX_TREE_CHARS: usize = 60_000;

const ACT_SYSTEM_PROMPT: &str = "You control a web browser. Translate the user's instruction into exactly ONE action on the current page.\n\
Reply with a single JSON object and nothing else:\n\
{\"action\": \"click|fill|select|hover|press|scroll|none\", \"ref\": \"e12\", \"value\": \"...\", \"reason\": \"...\"}\n\
Rules:\n\
- \"ref\" MUST be one of the @refs listed under Page Elements, written without the @.\n\
- fill and select need \"value\" (the text to type or option to choose).\n\
- press needs \"value\" set to a key name such as Enter; ref is not used.\n\
- scroll needs \"value\" set to up or down; ref is not used.\n\
- If no element on the page matches the instruction, reply {\"action\": \"none\", \"reason\": \"why\"}.";

const EXTRACT_SYSTEM_PROMPT: &str = "You extract structured data from a web page's accessibility tree.\n\
Reply with a single JSON object that matches the given JSON schema and nothing else.\n\
Use numbers for numeric fields (no currency symbols). Omit optional fields you cannot find.\n\
Only report data that is present on the page.";

/// Browser operation chosen by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Fill,
    Select,
    Hover,
    Press,
    Scroll,
    None,
}

impl ActionKind {
    fn needs_ref(self) -> bool {
        matches!(
            self,
            ActionKind::Click | ActionKind::Fill | ActionKind::Select | ActionKind::Hover
        )
    }

    fn needs_value(self) -> bool {
        matches!(self, ActionKind::Fill | ActionKind::Select | ActionKind::Press)
    }
}

/// One planned browser action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action: ActionKind,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionPlan {
    /// Parse a model reply into a plan
    pub fn parse(reply: &str) -> Result<Self> {
        let value = parse_json_reply(reply).map_err(|e| FlowError::action(e.to_string()))?;
        let mut plan: ActionPlan = serde_json::from_value(value)
            .map_err(|e| FlowError::action(format!("Unusable action plan: {}", e)))?;
        if let Some(ref_id) = plan.ref_id.take() {
            let clean = ref_id.trim().trim_start_matches('@').to_string();
            plan.ref_id = Some(clean).filter(|r| !r.is_empty());
        }
        Ok(plan)
    }

    /// Check the plan is executable against the page it was planned for
    pub fn validate(&self, snapshot: &Snapshot) -> Result<()> {
        if self.action == ActionKind::None {
            return Err(FlowError::action(format!(
                "No matching element: {}",
                self.reason.as_deref().unwrap_or("model found nothing to act on")
            )));
        }

        if self.action.needs_ref() {
            let ref_id = self.ref_id.as_deref().ok_or_else(|| {
                FlowError::action(format!("Planned {:?} without an element ref", self.action))
            })?;
            if snapshot.get_element(ref_id).is_none() {
                return Err(FlowError::action(format!(
                    "Planned element @{} is not on the page",
                    ref_id
                )));
            }
        }

        if self.action.needs_value() && self.value.as_deref().map_or(true, str::is_empty) {
            return Err(FlowError::action(format!(
                "Planned {:?} without a value",
                self.action
            )));
        }

        Ok(())
    }

    /// The element ref, prefixed the way agent-browser expects
    pub fn target(&self) -> Option<String> {
        self.ref_id.as_ref().map(|r| format!("@{}", r))
    }
}

/// Prompt asking the model to pick one action for `description`
pub fn build_act_messages(description: &str, snapshot: &Snapshot) -> Vec<Message> {
    vec![
        Message::system(ACT_SYSTEM_PROMPT),
        Message::user(format!(
            "Instruction: {}\n\n{}",
            description,
            snapshot.format_for_display()
        )),
    ]
}

/// Prompt asking the model to extract data matching `schema`
pub fn build_extract_messages(
    instruction: &str,
    schema: &ExtractSchema,
    snapshot: &Snapshot,
    page_url: Option<&str>,
) -> Vec<Message> {
    let tree = snapshot.raw_tree().unwrap_or_default();
    let tree = truncate_chars(tree, MAX_TREE_CHARS);

    let mut prompt = String::new();
    prompt.push_str("Instruction: ");
    prompt.push_str(instruction);
    if let Some(url) = page_url {
        prompt.push_str("\nPage URL: ");
        prompt.push_str(url);
    }
    prompt.push_str("\n\nJSON schema:\n");
    prompt.push_str(&serde_json::to_string_pretty(&schema.describe()).unwrap_or_default());
    prompt.push_str("\n\n=== PAGE ===\n");
    prompt.push_str(tree);
    prompt.push_str("\n=== END PAGE ===");

    vec![Message::system(EXTRACT_SYSTEM_PROMPT), Message::user(prompt)]
}

/// Find the JSON object in a model reply.
///
/// Tolerates markdown code fences and prose around the object.
pub fn parse_json_reply(reply: &str) -> Result<Value> {
    let trimmed = reply.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| FlowError::Other(format!("Model reply is not valid JSON: {}", e))),
        _ => Err(FlowError::Other(format!(
            "Model reply contains no JSON object: {}",
            truncate_chars(trimmed, 200)
        ))),
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Workflow variables and `{{name}}` template substitution

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{FlowError, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Named string values substituted into step text before dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(IndexMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a variable
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay another set of variables, replacing values with the same name
    pub fn merge(&mut self, other: &Variables) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Parse a `KEY=VALUE` assignment as given on the command line
    pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
        let (name, value) = raw.split_once('=').ok_or_else(|| {
            FlowError::config(format!("Variable '{}' must be written as KEY=VALUE", raw))
        })?;
        let name = name.trim();
        if !is_valid_name(name) {
            return Err(FlowError::config(format!("Invalid variable name '{}'", name)));
        }
        Ok((name.to_string(), value.to_string()))
    }

    /// Replace every `{{name}}` in `template` with its value.
    ///
    /// Fails on unterminated references, invalid names, and names with no value.
    pub fn substitute(&self, template: &str) -> Result<String> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find(OPEN) {
            output.push_str(&rest[..start]);
            let (name, after) = split_reference(&rest[start..], template)?;
            let value = self.get(name).ok_or_else(|| {
                FlowError::config(format!(
                    "Undefined variable '{}' referenced in \"{}\"",
                    name, template
                ))
            })?;
            output.push_str(value);
            rest = after;
        }

        output.push_str(rest);
        Ok(output)
    }
}

impl FromIterator<(String, String)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// List the variable names referenced by a template, in order of appearance
pub fn references(template: &str) -> Result<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let (name, after) = split_reference(&rest[start..], template)?;
        names.push(name);
        rest = after;
    }

    Ok(names)
}

/// `input` starts with `{{`; returns the trimmed name and the text after `}}`
fn split_reference<'a>(input: &'a str, template: &str) -> Result<(&'a str, &'a str)> {
    let body = &input[OPEN.len()..];
    let end = body.find(CLOSE).ok_or_else(|| {
        FlowError::config(format!("Unterminated variable reference in \"{}\"", template))
    })?;
    let name = body[..end].trim();
    if !is_valid_name(name) {
        return Err(FlowError::config(format!(
            "Invalid variable name '{}' in \"{}\"",
            name, template
        )));
    }
    Ok((name, &body[end + CLOSE.len()..]))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

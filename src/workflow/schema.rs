//! Schema descriptors for extract steps
//!
//! A schema is a top-level object of named fields. It is used in two places:
//! rendered into the extraction prompt, and applied to the model's reply to
//! shape it into an [`ExtractionResult`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{FlowError, Result};
use crate::workflow::result::ExtractionResult;

/// Primitive or composite type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

/// One named field of an extraction schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Missing or null values are accepted when set
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Element type, arrays only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaField>>,
    /// Nested fields, objects only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IndexMap<String, SchemaField>>,
}

impl SchemaField {
    fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: false,
            description: None,
            items: None,
            fields: None,
        }
    }

    pub fn string() -> Self {
        Self::of(FieldType::String)
    }

    pub fn number() -> Self {
        Self::of(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    pub fn array(items: SchemaField) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(FieldType::Array)
        }
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaField)>,
        K: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(|(k, f)| (k.into(), f)).collect()),
            ..Self::of(FieldType::Object)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self, path: &str) -> Result<()> {
        match self.field_type {
            FieldType::Array => {
                if self.fields.is_some() {
                    return Err(malformed(path, "array fields take 'items', not 'fields'"));
                }
                let items = self
                    .items
                    .as_ref()
                    .ok_or_else(|| malformed(path, "array is missing 'items'"))?;
                items.validate(&format!("{}[]", path))
            }
            FieldType::Object => {
                if self.items.is_some() {
                    return Err(malformed(path, "object fields take 'fields', not 'items'"));
                }
                let fields = self
                    .fields
                    .as_ref()
                    .ok_or_else(|| malformed(path, "object is missing 'fields'"))?;
                validate_fields(fields, path)
            }
            _ => {
                if self.items.is_some() || self.fields.is_some() {
                    return Err(malformed(
                        path,
                        "primitive fields cannot declare 'items' or 'fields'",
                    ));
                }
                Ok(())
            }
        }
    }

    fn describe(&self) -> Value {
        let mut out = Map::new();
        let type_name = match self.field_type {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        out.insert("type".into(), Value::from(type_name));
        if let Some(description) = &self.description {
            out.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(items) = &self.items {
            out.insert("items".into(), items.describe());
        }
        if let Some(fields) = &self.fields {
            let (properties, required) = describe_fields(fields);
            out.insert("properties".into(), properties);
            out.insert("required".into(), required);
        }
        Value::Object(out)
    }

    fn coerce(&self, value: Value, path: &str) -> Result<Value> {
        if value.is_null() {
            return if self.optional {
                Ok(Value::Null)
            } else {
                Err(mismatch(path, "a value", &value))
            };
        }

        match self.field_type {
            FieldType::String => match value {
                Value::String(_) => Ok(value),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                other => Err(mismatch(path, "a string", &other)),
            },
            FieldType::Number => match value {
                Value::Number(_) => Ok(value),
                Value::String(ref s) => parse_number(s)
                    .map(Value::Number)
                    .ok_or_else(|| mismatch(path, "a number", &value)),
                other => Err(mismatch(path, "a number", &other)),
            },
            FieldType::Boolean => match value {
                Value::Bool(_) => Ok(value),
                Value::String(ref s) => match s.trim().to_lowercase().as_str() {
                    "true" | "yes" => Ok(Value::Bool(true)),
                    "false" | "no" => Ok(Value::Bool(false)),
                    _ => Err(mismatch(path, "a boolean", &value)),
                },
                other => Err(mismatch(path, "a boolean", &other)),
            },
            FieldType::Array => {
                let items = match self.items.as_deref() {
                    Some(items) => items,
                    None => return Err(malformed(path, "array is missing 'items'")),
                };
                match value {
                    Value::Array(values) => values
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| items.coerce(v, &format!("{}[{}]", path, i)))
                        .collect::<Result<Vec<_>>>()
                        .map(Value::Array),
                    other => Err(mismatch(path, "an array", &other)),
                }
            }
            FieldType::Object => {
                let fields = match self.fields.as_ref() {
                    Some(fields) => fields,
                    None => return Err(malformed(path, "object is missing 'fields'")),
                };
                match value {
                    Value::Object(map) => coerce_fields(fields, map, path).map(Value::Object),
                    other => Err(mismatch(path, "an object", &other)),
                }
            }
        }
    }
}

/// Structural description of the data an extract step expects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractSchema {
    fields: IndexMap<String, SchemaField>,
}

impl ExtractSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration
    pub fn field(mut self, name: impl Into<String>, field: SchemaField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check that every composite field is well formed
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(FlowError::config("Extraction schema declares no fields"));
        }
        validate_fields(&self.fields, "")
    }

    /// JSON-Schema-like rendering used in model prompts
    pub fn describe(&self) -> Value {
        let (properties, required) = describe_fields(&self.fields);
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Shape a raw model reply into the declared structure
    pub fn coerce(&self, value: Value) -> Result<ExtractionResult> {
        match value {
            Value::Object(map) => coerce_fields(&self.fields, map, "").map(ExtractionResult::new),
            other => Err(mismatch("<root>", "an object", &other)),
        }
    }
}

fn validate_fields(fields: &IndexMap<String, SchemaField>, parent: &str) -> Result<()> {
    if fields.is_empty() {
        return Err(malformed(parent, "object declares no fields"));
    }
    for (name, field) in fields {
        field.validate(&join(parent, name))?;
    }
    Ok(())
}

fn describe_fields(fields: &IndexMap<String, SchemaField>) -> (Value, Value) {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, field)| (name.clone(), field.describe()))
        .collect();
    let required: Vec<Value> = fields
        .iter()
        .filter(|(_, field)| !field.optional)
        .map(|(name, _)| Value::from(name.as_str()))
        .collect();
    (Value::Object(properties), Value::Array(required))
}

fn coerce_fields(
    fields: &IndexMap<String, SchemaField>,
    mut map: Map<String, Value>,
    parent: &str,
) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for (name, field) in fields {
        let path = join(parent, name);
        let raw = map.remove(name).unwrap_or(Value::Null);
        let coerced = field.coerce(raw, &path)?;
        if !coerced.is_null() {
            out.insert(name.clone(), coerced);
        }
    }
    Ok(out)
}

/// Accepts "349.99", "$349.99", "1,299.00", " 12 "
fn parse_number(raw: &str) -> Option<serde_json::Number> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(int) = cleaned.parse::<i64>() {
        return Some(int.into());
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn malformed(path: &str, reason: &str) -> FlowError {
    let path = if path.is_empty() { "<root>" } else { path };
    FlowError::config(format!("Malformed schema at '{}': {}", path, reason))
}

fn mismatch(path: &str, expected: &str, found: &Value) -> FlowError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    FlowError::extraction(format!(
        "Field '{}' expected {}, found {}",
        path, expected, found
    ))
}

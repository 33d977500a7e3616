//! Input document parsing.
//!
//! Only structural failures are fatal here: the top level must be a JSON
//! array of records or a versioned envelope holding one. Individual records
//! are decoded later so that a single bad element is reported, not fatal.

use crate::core::config::{Policy, SeverityMaps};
use crate::core::error::GateError;
use serde::Deserialize;
use serde_json::Value;

pub const INPUT_SCHEMA_VERSION: &str = "1";

/// A parsed input document.
#[derive(Debug, Clone, Default)]
pub struct InputDocument {
    pub schema_version: Option<String>,
    pub records: Vec<Value>,
    pub severity_maps: Option<SeverityMaps>,
    pub policy: Option<Policy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default, alias = "schema_version")]
    schema_version: Option<Value>,
    records: Option<Value>,
    #[serde(default, alias = "severity_maps")]
    severity_maps: Option<SeverityMaps>,
    #[serde(default)]
    policy: Option<Policy>,
}

impl InputDocument {
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Concatenate another document's records; its maps and policy layer over ours.
    pub fn extend(&mut self, other: InputDocument) {
        self.records.extend(other.records);
        if let Some(maps) = other.severity_maps {
            match self.severity_maps.as_mut() {
                Some(existing) => existing.merge(&maps),
                None => self.severity_maps = Some(maps),
            }
        }
        if other.policy.is_some() {
            self.policy = other.policy;
        }
        if self.schema_version.is_none() {
            self.schema_version = other.schema_version;
        }
    }
}

/// Parse an input document from JSON text.
pub fn parse_input(text: &str) -> Result<InputDocument, GateError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| GateError::MalformedInput(format!("input is not valid JSON: {}", e)))?;
    parse_input_value(value)
}

pub fn parse_input_value(value: Value) -> Result<InputDocument, GateError> {
    match value {
        Value::Array(records) => Ok(InputDocument::from_records(records)),
        Value::Object(_) => {
            let envelope: Envelope = serde_json::from_value(value).map_err(|e| {
                GateError::MalformedInput(format!("input envelope is invalid: {}", e))
            })?;
            let schema_version = envelope
                .schema_version
                .map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                });
            if let Some(version) = &schema_version {
                check_schema_version(version)?;
            }
            let records = match envelope.records {
                Some(Value::Array(records)) => records,
                Some(_) => {
                    return Err(GateError::MalformedInput(
                        "\"records\" must be an array".into(),
                    ));
                }
                None => {
                    return Err(GateError::MalformedInput(
                        "input object has no \"records\" array".into(),
                    ));
                }
            };
            Ok(InputDocument {
                schema_version,
                records,
                severity_maps: envelope.severity_maps,
                policy: envelope.policy,
            })
        }
        other => Err(GateError::MalformedInput(format!(
            "expected an array of records or an object with \"records\", got {}",
            json_type_name(&other)
        ))),
    }
}

fn check_schema_version(version: &str) -> Result<(), GateError> {
    let major = version.trim().split('.').next().unwrap_or_default();
    if major == INPUT_SCHEMA_VERSION {
        Ok(())
    } else {
        Err(GateError::MalformedInput(format!(
            "unsupported schemaVersion '{}': expected {}.x",
            version, INPUT_SCHEMA_VERSION
        )))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

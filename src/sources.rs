//! Source adapter registration.
//!
//! Adding a new tool: write the adapter under `plugins/` and append one
//! entry to `SOURCES`.

use crate::core::error::GateError;
use crate::core::model::RawRecord;
use crate::plugins::{checkov, terraform, tfsec};
use serde_json::Value;

pub struct SourceAdapter {
    pub name: &'static str,
    pub description: &'static str,
    pub parse: fn(&Value) -> Result<Vec<RawRecord>, GateError>,
    pub schema: fn() -> Value,
}

pub const SOURCES: &[SourceAdapter] = &[
    SourceAdapter {
        name: terraform::NAME,
        description: "terraform show -json plan",
        parse: terraform::parse,
        schema: terraform::schema,
    },
    SourceAdapter {
        name: tfsec::NAME,
        description: "tfsec --format json",
        parse: tfsec::parse,
        schema: tfsec::schema,
    },
    SourceAdapter {
        name: checkov::NAME,
        description: "checkov -o json",
        parse: checkov::parse,
        schema: checkov::schema,
    },
];

/// Look up an adapter by tool name, case-insensitively.
pub fn find_source(name: &str) -> Result<&'static SourceAdapter, GateError> {
    let wanted = name.trim();
    SOURCES
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            let known: Vec<&str> = SOURCES.iter().map(|s| s.name).collect();
            GateError::UnknownSource(format!("'{}' (known: {})", wanted, known.join(", ")))
        })
}

/// Parse native tool output text into raw records.
pub fn ingest(tool: &str, text: &str) -> Result<Vec<RawRecord>, GateError> {
    let adapter = find_source(tool)?;
    let value: Value = serde_json::from_str(text).map_err(|e| {
        GateError::MalformedInput(format!("{} output is not valid JSON: {}", adapter.name, e))
    })?;
    (adapter.parse)(&value)
}

/// Records as JSON values, in the shape the input decoder accepts.
pub fn records_to_values(records: &[RawRecord]) -> Result<Vec<Value>, GateError> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(GateError::from))
        .collect()
}

pub fn schemas() -> Value {
    Value::Array(SOURCES.iter().map(|s| (s.schema)()).collect())
}

//! `tfsec --format json` adapter.

use crate::core::error::GateError;
use crate::core::model::{FindingRecord, RawRecord};
use serde::Deserialize;
use serde_json::Value;

pub const NAME: &str = "tfsec";

// tfsec result status: 0 failed, 1 passed, 2 ignored.
const STATUS_PASSED: i64 = 1;
const STATUS_IGNORED: i64 = 2;

#[derive(Debug, Deserialize)]
struct Output {
    #[serde(default)]
    results: Option<Vec<TfsecResult>>,
}

#[derive(Debug, Deserialize)]
struct TfsecResult {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    long_id: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    start_line: Option<u32>,
}

pub fn parse(output: &Value) -> Result<Vec<RawRecord>, GateError> {
    let parsed: Output = serde_json::from_value(output.clone())
        .map_err(|e| GateError::MalformedInput(format!("tfsec output: {}", e)))?;

    let records: Vec<RawRecord> = parsed
        .results
        .unwrap_or_default()
        .into_iter()
        .filter(|r| !matches!(r.status, Some(STATUS_PASSED | STATUS_IGNORED)))
        .map(|r| {
            let rule_id = r.long_id.filter(|s| !s.is_empty()).or(r.rule_id);
            let category = match &rule_id {
                Some(id) if id.to_ascii_lowercase().contains("secret") => "secret",
                _ => "compliance",
            };
            let location = r.location.unwrap_or(Location {
                filename: None,
                start_line: None,
            });
            RawRecord::Finding(FindingRecord {
                source_tool: Some(NAME.to_string()),
                rule_id,
                native_severity: r.severity,
                resource_or_file: location.filename,
                line: location.start_line,
                message: r.description,
                category: Some(category.to_string()),
            })
        })
        .collect();
    tracing::debug!(records = records.len(), "tfsec output ingested");
    Ok(records)
}

pub fn schema() -> Value {
    serde_json::json!({
        "name": NAME,
        "version": "0.1.0",
        "description": "Static analysis findings from `tfsec --format json`",
        "emits": "finding",
        "reads": [
            "results[].long_id",
            "results[].rule_id",
            "results[].severity",
            "results[].description",
            "results[].status",
            "results[].location.filename",
            "results[].location.start_line"
        ],
        "skips": ["passed results", "ignored results"]
    })
}

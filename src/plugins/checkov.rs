//! `checkov -o json` adapter.
//!
//! Checkov prints one object per framework, or an array of them when several
//! frameworks ran. Only failed checks become findings.

use crate::core::error::GateError;
use crate::core::model::{FindingRecord, RawRecord};
use serde_json::Value;

pub const NAME: &str = "checkov";

/// Native severity used when a failed check carries none.
pub const FAILED_SEVERITY: &str = "FAILED";

pub fn parse(output: &Value) -> Result<Vec<RawRecord>, GateError> {
    let reports: Vec<&Value> = match output {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![output],
        _ => {
            return Err(GateError::MalformedInput(
                "checkov output must be an object or an array of objects".into(),
            ));
        }
    };

    let mut records = Vec::new();
    for report in reports {
        let Some(failed) = report
            .get("results")
            .and_then(|r| r.get("failed_checks"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        records.extend(failed.iter().map(failed_check));
    }
    tracing::debug!(records = records.len(), "checkov output ingested");
    Ok(records)
}

fn failed_check(check: &Value) -> RawRecord {
    let text = |key: &str| check.get(key).and_then(Value::as_str).map(String::from);
    let check_id = text("check_id");
    let category = match &check_id {
        Some(id) if id.starts_with("CKV_SECRET") => "secret",
        _ => "compliance",
    };
    let line = check
        .get("file_line_range")
        .and_then(Value::as_array)
        .and_then(|range| range.first())
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok())
        .filter(|l| *l > 0);
    let severity = text("severity")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FAILED_SEVERITY.to_string());
    let message = match (text("check_name"), text("resource")) {
        (Some(name), Some(resource)) => Some(format!("{} ({})", name, resource)),
        (name, _) => name,
    };

    RawRecord::Finding(FindingRecord {
        source_tool: Some(NAME.to_string()),
        rule_id: check_id,
        native_severity: Some(severity),
        resource_or_file: text("file_path"),
        line,
        message,
        category: Some(category.to_string()),
    })
}

pub fn schema() -> Value {
    serde_json::json!({
        "name": NAME,
        "version": "0.1.0",
        "description": "Policy check failures from `checkov -o json`",
        "emits": "finding",
        "reads": [
            "results.failed_checks[].check_id",
            "results.failed_checks[].check_name",
            "results.failed_checks[].severity",
            "results.failed_checks[].file_path",
            "results.failed_checks[].file_line_range",
            "results.failed_checks[].resource"
        ],
        "defaults": {"severity": FAILED_SEVERITY}
    })
}

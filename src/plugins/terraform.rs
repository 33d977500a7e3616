//! `terraform show -json` plan adapter.
//!
//! Reads `resource_changes[]` into change records. Sensitive attribute values
//! are replaced by a digest before they leave this module, so equality is
//! still comparable but the value itself never reaches the engine.

use crate::core::error::GateError;
use crate::core::model::{AttributeValue, Attributes, ChangeRecord, RawRecord};
use crate::core::redact::sensitive_digest;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const NAME: &str = "terraform";

pub fn parse(plan: &Value) -> Result<Vec<RawRecord>, GateError> {
    let root = plan.as_object().ok_or_else(|| {
        GateError::MalformedInput("terraform plan JSON must be an object".into())
    })?;

    let changes = match root.get("resource_changes") {
        None | Some(Value::Null) => {
            tracing::debug!("plan has no resource_changes");
            return Ok(Vec::new());
        }
        Some(Value::Array(changes)) => changes,
        Some(_) => {
            return Err(GateError::MalformedInput(
                "terraform plan: resource_changes must be an array".into(),
            ));
        }
    };

    let mut depends_on = BTreeMap::new();
    if let Some(module) = root
        .get("configuration")
        .and_then(|c| c.get("root_module"))
    {
        collect_dependencies(module, "", &mut depends_on);
    }

    let mut records = Vec::new();
    for entry in changes {
        if entry.get("mode").and_then(Value::as_str) == Some("data") {
            continue;
        }
        let change = entry.get("change").unwrap_or(&Value::Null);
        let actions: Vec<String> = change
            .get("actions")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        if actions.iter().all(|a| a == "no-op" || a == "read") && !actions.is_empty() {
            continue;
        }

        let address = entry.get("address").and_then(Value::as_str).map(String::from);
        let deps = address
            .as_deref()
            .map(strip_instance_key)
            .and_then(|a| depends_on.get(a).cloned())
            .unwrap_or_default();
        records.push(RawRecord::Change(ChangeRecord {
            resource_type: entry.get("type").and_then(Value::as_str).map(String::from),
            // An empty list is passed through so the engine reports it.
            actions: change.get("actions").map(|_| actions),
            attributes_before: attributes(change.get("before"), change.get("before_sensitive")),
            attributes_after: attributes(change.get("after"), change.get("after_sensitive")),
            depends_on: deps,
            source_tool: Some(NAME.to_string()),
            address,
            ..ChangeRecord::default()
        }));
    }
    tracing::debug!(records = records.len(), "terraform plan ingested");
    Ok(records)
}

fn attributes(values: Option<&Value>, sensitive: Option<&Value>) -> Option<Attributes> {
    let values = values?.as_object()?;
    let markers = sensitive.and_then(Value::as_object);
    Some(
        values
            .iter()
            .map(|(name, value)| {
                let attr = if is_marked(markers, name) {
                    AttributeValue::Marked {
                        value: Value::String(sensitive_digest(value)),
                        sensitive: true,
                    }
                } else {
                    AttributeValue::Plain(value.clone())
                };
                (name.clone(), attr)
            })
            .collect(),
    )
}

fn is_marked(markers: Option<&Map<String, Value>>, name: &str) -> bool {
    markers
        .and_then(|m| m.get(name))
        .is_some_and(contains_true)
}

/// `*_sensitive` mirrors the value's shape; any `true` inside marks the attribute.
fn contains_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Array(items) => items.iter().any(contains_true),
        Value::Object(map) => map.values().any(contains_true),
        _ => false,
    }
}

/// `aws_instance.web[0]` and `aws_instance.web["a"]` share the configuration address `aws_instance.web`.
fn strip_instance_key(address: &str) -> &str {
    match address.rfind('[') {
        Some(idx) if address.ends_with(']') => &address[..idx],
        _ => address,
    }
}

fn collect_dependencies(
    module: &Value,
    prefix: &str,
    out: &mut BTreeMap<String, BTreeSet<String>>,
) {
    for resource in module
        .get("resources")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(address) = resource.get("address").and_then(Value::as_str) else {
            continue;
        };
        let deps: BTreeSet<String> = resource
            .get("depends_on")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(|d| format!("{}{}", prefix, d))
            .collect();
        if !deps.is_empty() {
            out.insert(format!("{}{}", prefix, address), deps);
        }
    }

    if let Some(calls) = module.get("module_calls").and_then(Value::as_object) {
        for (name, call) in calls {
            if let Some(child) = call.get("module") {
                collect_dependencies(child, &format!("{}module.{}.", prefix, name), out);
            }
        }
    }
}

pub fn schema() -> Value {
    serde_json::json!({
        "name": NAME,
        "version": "0.1.0",
        "description": "Infrastructure plan changes from `terraform show -json`",
        "emits": "change",
        "reads": [
            "resource_changes[].address",
            "resource_changes[].type",
            "resource_changes[].mode",
            "resource_changes[].change.actions",
            "resource_changes[].change.before",
            "resource_changes[].change.after",
            "resource_changes[].change.before_sensitive",
            "resource_changes[].change.after_sensitive",
            "configuration.root_module.resources[].depends_on"
        ],
        "skips": ["data sources", "no-op and read actions"]
    })
}

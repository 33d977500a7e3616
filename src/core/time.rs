//! Timestamps and envelopes for auxiliary command output.
//!
//! Reports carry no timestamps so identical inputs render identical bytes.
//! Only the envelope that `ingest` wraps around converted records is stamped.

use crate::core::input::INPUT_SCHEMA_VERSION;
use serde_json::{Map, Value, json};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Unix-epoch seconds with a `Z` suffix, e.g. `1771220592Z`.
pub fn now_epoch_z() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Envelope header shared by every stamped command.
fn stamp(cmd: &str, status: &str) -> Map<String, Value> {
    let mut header = Map::new();
    header.insert("envelopeVersion".into(), json!(ENVELOPE_VERSION));
    header.insert("ts".into(), json!(now_epoch_z()));
    header.insert("eventId".into(), json!(new_event_id()));
    header.insert("cmd".into(), json!(cmd));
    header.insert("status".into(), json!(status));
    header
}

/// Converted adapter output, shaped so `evaluate --input` accepts it as a
/// versioned record document.
pub fn ingest_envelope(tool: &str, records: Vec<Value>) -> Value {
    let mut envelope = stamp("ingest", "ok");
    envelope.insert("schemaVersion".into(), json!(INPUT_SCHEMA_VERSION));
    envelope.insert("tool".into(), json!(tool));
    envelope.insert("count".into(), json!(records.len()));
    envelope.insert("records".into(), Value::Array(records));
    Value::Object(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::parse_input_value;

    #[test]
    fn test_now_epoch_z_format() {
        let stamp = now_epoch_z();
        assert!(stamp.ends_with('Z'));
        assert!(stamp.trim_end_matches('Z').parse::<u64>().is_ok());
    }

    #[test]
    fn test_event_ids_are_distinct_ulids() {
        let id = new_event_id();
        assert!(Ulid::from_string(&id).is_ok());
        assert_ne!(id, new_event_id());
    }

    #[test]
    fn test_ingest_envelope_is_a_valid_input_document() {
        let envelope = ingest_envelope(
            "tfsec",
            vec![json!({"kind": "finding", "sourceTool": "tfsec", "ruleId": "R"})],
        );
        assert_eq!(envelope["cmd"], "ingest");
        assert_eq!(envelope["tool"], "tfsec");
        assert_eq!(envelope["count"], 1);
        assert_eq!(envelope["envelopeVersion"], ENVELOPE_VERSION);

        let doc = parse_input_value(envelope).unwrap();
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.schema_version.as_deref(), Some(INPUT_SCHEMA_VERSION));
    }
}

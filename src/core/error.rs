use crate::core::model::Category;
use serde::Serialize;
use std::io;
use thiserror::Error;

/// Errors that abort an invocation before (or instead of) producing a report.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unknown source tool: {0}")]
    UnknownSource(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Per-record failures. A record that hits one of these is excluded from
/// scoring and listed in the report; the run itself always completes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum RecordError {
    #[serde(rename = "InvalidRecordError")]
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[serde(rename = "UnknownActionSetError")]
    #[error("unknown action set [{}]", .actions.join(", "))]
    UnknownActionSet { actions: Vec<String> },

    #[serde(rename = "ConflictingClassificationError")]
    #[error(
        "conflicting classification for {id}: {}",
        .categories.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" vs ")
    )]
    ConflictingClassification { id: String, categories: Vec<Category> },

    #[serde(rename = "UnmappedSeverityError")]
    #[error("unmapped severity '{native_severity}' reported by {source_tool}")]
    UnmappedSeverity {
        source_tool: String,
        native_severity: String,
    },
}

impl RecordError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::InvalidRecord { .. } => "InvalidRecordError",
            Self::UnknownActionSet { .. } => "UnknownActionSetError",
            Self::ConflictingClassification { .. } => "ConflictingClassificationError",
            Self::UnmappedSeverity { .. } => "UnmappedSeverityError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_serializes_with_kind_tag() {
        let err = RecordError::UnmappedSeverity {
            source_tool: "tfsec".to_string(),
            native_severity: "SEVERE".to_string(),
        };
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "UnmappedSeverityError");
        assert_eq!(value["sourceTool"], "tfsec");
        assert_eq!(value["nativeSeverity"], "SEVERE");
    }

    #[test]
    fn test_unknown_action_set_message_lists_actions() {
        let err = RecordError::UnknownActionSet {
            actions: vec!["update".to_string(), "delete".to_string()],
        };
        assert_eq!(err.to_string(), "unknown action set [update, delete]");
        assert_eq!(err.kind_name(), "UnknownActionSetError");
    }
}

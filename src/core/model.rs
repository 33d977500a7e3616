//! Record model shared by every pipeline stage.
//!
//! Two families of types live here:
//! - Raw records (`ChangeRecord`, `FindingRecord`) exactly as collaborators hand
//!   them over. Every field is optional at the serde level so that one bad
//!   record can be reported instead of failing the whole input array.
//! - `NormalizedRecord`, the single internal shape produced by the normalizer.

use crate::core::error::RecordError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Normalized severity tier. Declaration order is the strictness order,
/// so `Ord` compares by severity (`Info < Low < … < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All tiers, most severe first.
    pub const DESCENDING: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Self::Info),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!(
                "invalid severity '{}': expected CRITICAL|HIGH|MEDIUM|LOW|INFO",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Category of a normalized record. Exactly one per record, fixed at
/// classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Add,
    Modify,
    Destroy,
    Replace,
    Secret,
    Pii,
    Compliance,
    NonInclusiveLanguage,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Destroy => "destroy",
            Self::Replace => "replace",
            Self::Secret => "secret",
            Self::Pii => "pii",
            Self::Compliance => "compliance",
            Self::NonInclusiveLanguage => "non-inclusive-language",
            Self::Other => "other",
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Modify | Self::Destroy | Self::Replace
        )
    }

    /// Parse the finding-side vocabulary (`secret | pii | compliance |
    /// non-inclusive-language | other`). Change categories are not accepted.
    pub fn parse_finding(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match key.as_str() {
            "secret" | "secrets" => Some(Self::Secret),
            "pii" => Some(Self::Pii),
            "compliance" => Some(Self::Compliance),
            "non-inclusive-language" | "noninclusivelanguage" | "inclusive-language" => {
                Some(Self::NonInclusiveLanguage)
            }
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Change,
    Finding,
}

/// One entry of a change record's action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
    NoOp,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "no-op" | "noop" | "no_op" => Some(Self::NoOp),
            _ => None,
        }
    }
}

/// Where a record points: a resource address or a file path, optionally with a line.
/// Ordering is by target, then line, which is the listing order used in reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

static TRAILING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<target>.+?):(?P<line>\d+)$").unwrap());

impl Locator {
    /// Build a locator from a raw path/address and an optional explicit line.
    ///
    /// Paths are normalized so that `./main.tf`, `/main.tf` and `main.tf`
    /// compare equal; a trailing `:<line>` is split off when no explicit line is given.
    pub fn parse(raw: &str, line: Option<u32>) -> Self {
        let mut target = raw.trim().replace('\\', "/");
        let mut line = line;
        if line.is_none() {
            if let Some(caps) = TRAILING_LINE.captures(&target) {
                let parsed = caps["line"].parse::<u32>().ok();
                if parsed.is_some() {
                    line = parsed;
                    target = caps["target"].to_string();
                }
            }
        }
        while let Some(rest) = target.strip_prefix("./") {
            target = rest.to_string();
        }
        let target = target.trim_start_matches('/').to_string();
        Self { target, line }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.target, line),
            None => f.write_str(&self.target),
        }
    }
}

/// Attribute value in a change record. Values can be flagged sensitive either
/// with the `{ "value": …, "sensitive": true }` wrapper or by a redaction
/// placeholder string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Marked {
        #[serde(default)]
        value: Value,
        sensitive: bool,
    },
    Plain(Value),
}

const SENSITIVE_PLACEHOLDERS: [&str; 3] = ["sensitive", "(sensitive)", "(sensitive value)"];

impl AttributeValue {
    pub fn is_sensitive(&self) -> bool {
        match self {
            Self::Marked { sensitive, .. } => *sensitive,
            Self::Plain(Value::String(s)) => SENSITIVE_PLACEHOLDERS.contains(&s.trim()),
            Self::Plain(_) => false,
        }
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// A proposed infrastructure change, as emitted by a planning tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_before: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_after: Option<Attributes>,
    #[serde(
        default,
        alias = "sensitiveAttributes",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub sensitive_fields_touched: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tool: Option<String>,
}

/// A scanner finding in the reporting tool's own severity vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_or_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// External input record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawRecord {
    Change(ChangeRecord),
    Finding(FindingRecord),
}

// Keys only one kind carries. Shared keys such as `sourceTool` or `message`
// never decide the kind.
const CHANGE_KEYS: [&str; 4] = ["address", "actions", "attributesBefore", "attributesAfter"];
const FINDING_KEYS: [&str; 3] = ["ruleId", "nativeSeverity", "resourceOrFile"];

impl RawRecord {
    /// Decode one element of the input array.
    ///
    /// The kind comes from an explicit `"kind"` key when present, otherwise it
    /// is inferred from which fields the object carries.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RecordError::invalid("record is not a JSON object"))?;

        let kind = match obj.get("kind").and_then(Value::as_str) {
            Some(k) if k.eq_ignore_ascii_case("change") => RecordKind::Change,
            Some(k) if k.eq_ignore_ascii_case("finding") => RecordKind::Finding,
            Some(k) => {
                return Err(RecordError::invalid(format!(
                    "unknown record kind '{}': expected change|finding",
                    k
                )));
            }
            None => {
                let has_change = CHANGE_KEYS.iter().any(|k| obj.contains_key(*k));
                let has_finding = FINDING_KEYS.iter().any(|k| obj.contains_key(*k));
                match (has_change, has_finding) {
                    (true, false) => RecordKind::Change,
                    (false, true) => RecordKind::Finding,
                    (true, true) => {
                        return Err(RecordError::invalid(
                            "record mixes change and finding fields; set \"kind\" explicitly",
                        ));
                    }
                    (false, false) => {
                        return Err(RecordError::invalid(
                            "record is neither a change nor a finding",
                        ));
                    }
                }
            }
        };

        match kind {
            RecordKind::Change => serde_json::from_value::<ChangeRecord>(value.clone())
                .map(Self::Change)
                .map_err(|e| RecordError::invalid(format!("change record: {}", e))),
            RecordKind::Finding => serde_json::from_value::<FindingRecord>(value.clone())
                .map(Self::Finding)
                .map_err(|e| RecordError::invalid(format!("finding record: {}", e))),
        }
    }

    /// Best-effort locator text for diagnostics about records that could not be normalized.
    pub fn locator_hint(&self) -> Option<String> {
        match self {
            Self::Change(c) => c.address.clone(),
            Self::Finding(f) => f.resource_or_file.clone(),
        }
    }
}

/// The engine-internal record shape produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Stable hash of locator + rule/action signature; the dedup key.
    pub id: String,
    pub kind: RecordKind,
    pub severity: Severity,
    pub category: Category,
    pub locator: Locator,
    /// `ruleId` for findings, `change:<category>` for changes.
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub sensitive_fields_touched: BTreeSet<String>,
    pub provenance: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_delta: Option<f64>,
}

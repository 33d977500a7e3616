//! Engine configuration: gate policy, per-tool severity maps, stateful
//! resource types and report sizing.
//!
//! Configuration is TOML on disk and may also arrive inline (JSON) with the
//! input document. Both are layered over the embedded defaults.

use crate::core::assets;
use crate::core::error::GateError;
use crate::core::model::Severity;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_ENV_VAR: &str = "RISKGATE_CONFIG";
pub const CONFIG_FILE_NAME: &str = "riskgate.toml";

/// What a fired rule does to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Block,
    Warn,
}

impl FromStr for RuleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "warn" => Ok(Self::Warn),
            other => Err(format!("invalid rule action '{}': expected block|warn", other)),
        }
    }
}

impl<'de> Deserialize<'de> for RuleAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Warn => write!(f, "warn"),
        }
    }
}

/// One threshold: fires when more than `max_count` records are at or above `severity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub severity: Severity,
    #[serde(rename = "maxCount", alias = "max_count")]
    pub max_count: usize,
    pub action: RuleAction,
}

/// Ordered gate rules. Read-only for the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Per-tool lookup from native severity vocabulary to the normalized tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityMaps(pub BTreeMap<String, BTreeMap<String, Severity>>);

impl SeverityMaps {
    /// Look up a native severity for a tool. Both keys compare case-insensitively.
    pub fn lookup(&self, tool: &str, native: &str) -> Option<Severity> {
        let tool = tool.trim();
        let native = native.trim();
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tool))
            .and_then(|(_, table)| {
                table
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(native))
                    .map(|(_, severity)| *severity)
            })
    }

    /// Layer `other` over `self`; entries in `other` win.
    pub fn merge(&mut self, other: &SeverityMaps) {
        for (tool, table) in &other.0 {
            let existing = self
                .0
                .keys()
                .find(|name| name.eq_ignore_ascii_case(tool))
                .cloned()
                .unwrap_or_else(|| tool.clone());
            let target = self.0.entry(existing).or_default();
            for (native, severity) in table {
                target.retain(|key, _| !key.eq_ignore_ascii_case(native));
                target.insert(native.clone(), *severity);
            }
        }
    }

    pub fn tools(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Effective configuration for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub policy: Policy,
    pub severity_maps: SeverityMaps,
    pub stateful_resource_types: Vec<String>,
    pub top_n: usize,
}

/// On-disk shape; every section is optional so partial files layer cleanly.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    policy: Option<Policy>,
    #[serde(default, alias = "severityMaps")]
    severity_maps: Option<SeverityMaps>,
    #[serde(default, alias = "statefulResourceTypes")]
    stateful_resource_types: Option<Vec<String>>,
    #[serde(default, alias = "topN")]
    top_n: Option<usize>,
}

impl EngineConfig {
    /// The configuration baked into the binary.
    pub fn defaults() -> Result<Self, GateError> {
        let file = parse_config_str(assets::DEFAULT_CONFIG, "embedded defaults")?;
        let config = Self {
            policy: file.policy.unwrap_or_default(),
            severity_maps: file.severity_maps.unwrap_or_default(),
            stateful_resource_types: file.stateful_resource_types.unwrap_or_default(),
            top_n: file.top_n.unwrap_or(10),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply input-supplied overrides: maps merge per tool, a policy replaces.
    pub fn with_overrides(mut self, maps: Option<&SeverityMaps>, policy: Option<&Policy>) -> Self {
        if let Some(maps) = maps {
            self.severity_maps.merge(maps);
        }
        if let Some(policy) = policy {
            self.policy = policy.clone();
        }
        self
    }

    pub fn is_stateful(&self, resource_type: &str) -> bool {
        self.stateful_resource_types
            .iter()
            .any(|pattern| glob_match(pattern, resource_type))
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if self.top_n == 0 {
            return Err(GateError::ConfigError("top_n must be at least 1".into()));
        }
        if self.policy.rules.is_empty() {
            tracing::warn!("policy has no rules; every evaluation will pass");
        }
        for pattern in &self.stateful_resource_types {
            if pattern.trim().is_empty() {
                return Err(GateError::ConfigError(
                    "stateful_resource_types contains an empty pattern".into(),
                ));
            }
        }
        Ok(())
    }

    fn layer(mut self, file: ConfigFile) -> Self {
        if let Some(policy) = file.policy {
            self.policy = policy;
        }
        if let Some(maps) = file.severity_maps {
            self.severity_maps.merge(&maps);
        }
        if let Some(types) = file.stateful_resource_types {
            self.stateful_resource_types = types;
        }
        if let Some(top_n) = file.top_n {
            self.top_n = top_n;
        }
        self
    }
}

fn parse_config_str(content: &str, origin: &str) -> Result<ConfigFile, GateError> {
    toml::from_str(content)
        .map_err(|e| GateError::ConfigError(format!("{}: {}", origin, e)))
}

/// Locate the configuration file to use, if any.
///
/// An explicit path wins, then `RISKGATE_CONFIG`, then `riskgate.toml` or
/// `.riskgate/config.toml` under `base_dir`.
pub fn resolve_config_path(explicit: Option<&Path>, base_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    [
        base_dir.join(CONFIG_FILE_NAME),
        base_dir.join(".riskgate").join("config.toml"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Load the effective configuration. No file means embedded defaults; a named
/// file that does not exist is an error.
pub fn load_config(explicit: Option<&Path>, base_dir: &Path) -> Result<EngineConfig, GateError> {
    let defaults = EngineConfig::defaults()?;
    let Some(path) = resolve_config_path(explicit, base_dir) else {
        tracing::debug!("no configuration file found; using embedded defaults");
        return Ok(defaults);
    };

    if !path.is_file() {
        return Err(GateError::ConfigError(format!(
            "configuration file not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(&path).map_err(GateError::IoError)?;
    let file = parse_config_str(&content, &path.display().to_string())?;
    let config = defaults.layer(file);
    config.validate()?;
    tracing::debug!(path = %path.display(), rules = config.policy.rules.len(), "configuration loaded");
    Ok(config)
}

/// Parse a configuration document held in memory and layer it over the defaults.
pub fn config_from_str(content: &str) -> Result<EngineConfig, GateError> {
    let file = parse_config_str(content, "inline configuration")?;
    let config = EngineConfig::defaults()?.layer(file);
    config.validate()?;
    Ok(config)
}

/// Simple glob match: `*` matches any run of characters.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.trim();
    if !pattern.contains('*') {
        return pattern == text;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !text.starts_with(first) || !text[first.len()..].ends_with(last) {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for middle in &parts[1..parts.len() - 1] {
        if middle.is_empty() {
            continue;
        }
        match rest.find(middle) {
            Some(idx) => rest = &rest[idx + middle.len()..],
            None => return false,
        }
    }
    true
}

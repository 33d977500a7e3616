//! Report assembly.
//!
//! The `Report` is the only thing an evaluation hands back. It is fully
//! deterministic for a given input and configuration: no timestamps, no
//! random ids, and a fixed ordering for every list it contains.

use crate::core::model::{NormalizedRecord, Severity};
use crate::engine::dedup::Conflict;
use crate::engine::gate::{FiredRule, GateDecision, GateOutcome};
use crate::engine::normalize::{UnmappedSeverity, UnparsedInput};
use crate::engine::score::RiskSummary;
use serde::Serialize;
use serde_json::{Value, json};

pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Everything the pipeline set aside on its way to the summary.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub input_count: usize,
    pub unparsed: Vec<UnparsedInput>,
    pub unmapped: Vec<UnmappedSeverity>,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub input_count: usize,
    pub evaluated_count: usize,
    pub unmapped_severities: Vec<UnmappedSeverity>,
    /// Human-readable lines for every non-fatal problem seen during the run.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub schema_version: String,
    pub decision: GateOutcome,
    pub aggregate_level: Severity,
    pub summary: RiskSummary,
    pub fired_rules: Vec<FiredRule>,
    pub top_findings: Vec<NormalizedRecord>,
    pub conflicts: Vec<Conflict>,
    pub unparsed_inputs: Vec<UnparsedInput>,
    pub metadata: ReportMetadata,
    pub payload: Value,
}

impl Report {
    pub fn exit_code(&self) -> i32 {
        match self.decision {
            GateOutcome::Pass => 0,
            GateOutcome::Block => 1,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.decision == GateOutcome::Block
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Listing order: severity descending, then locator ascending, then id ascending.
pub fn sort_for_listing(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.locator.cmp(&b.locator))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// The `top_n` most severe records in listing order.
pub fn top_records(records: &[NormalizedRecord], top_n: usize) -> Vec<NormalizedRecord> {
    let mut sorted = records.to_vec();
    sort_for_listing(&mut sorted);
    sorted.truncate(top_n);
    sorted
}

pub fn render(
    records: &[NormalizedRecord],
    summary: &RiskSummary,
    decision: &GateDecision,
    diagnostics: Diagnostics,
    top_n: usize,
) -> Report {
    let top_findings = top_records(records, top_n);
    let warnings = collect_warnings(decision, &diagnostics);
    let payload = build_payload(summary, decision, &top_findings, &diagnostics);

    let Diagnostics {
        input_count,
        unparsed,
        unmapped,
        conflicts,
    } = diagnostics;

    Report {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        decision: decision.outcome,
        aggregate_level: summary.aggregate_level,
        summary: summary.clone(),
        fired_rules: decision.fired_rules.clone(),
        top_findings,
        conflicts,
        unparsed_inputs: unparsed,
        metadata: ReportMetadata {
            input_count,
            evaluated_count: records.len(),
            unmapped_severities: unmapped,
            warnings,
        },
        payload,
    }
}

fn collect_warnings(decision: &GateDecision, diagnostics: &Diagnostics) -> Vec<String> {
    let mut warnings = Vec::new();
    for entry in &diagnostics.unmapped {
        warnings.push(format!(
            "{} at {} (input #{}); treated as {}",
            entry.error, entry.locator, entry.index, entry.assigned
        ));
    }
    for entry in &diagnostics.unparsed {
        match &entry.locator {
            Some(locator) => warnings.push(format!(
                "input #{} ({}) excluded: {}",
                entry.index, locator, entry.error
            )),
            None => warnings.push(format!("input #{} excluded: {}", entry.index, entry.error)),
        }
    }
    for conflict in &diagnostics.conflicts {
        warnings.push(format!("{} at {}", conflict.error(), conflict.locator));
    }
    for fired in decision.warnings() {
        warnings.push(fired.describe());
    }
    warnings
}

fn build_payload(
    summary: &RiskSummary,
    decision: &GateDecision,
    top: &[NormalizedRecord],
    diagnostics: &Diagnostics,
) -> Value {
    let counts: serde_json::Map<String, Value> = Severity::DESCENDING
        .iter()
        .map(|s| (s.as_str().to_string(), json!(summary.count(*s))))
        .collect();
    json!({
        "decision": decision.outcome,
        "exitCode": decision.exit_code(),
        "aggregateLevel": summary.aggregate_level,
        "counts": counts,
        "total": summary.total,
        "firedRules": decision.fired_rules.iter().map(|f| f.index).collect::<Vec<_>>(),
        "blockingRules": decision.blocking_rules().map(|f| f.index).collect::<Vec<_>>(),
        "topIds": top.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        "diagnostics": {
            "unparsed": diagnostics.unparsed.len(),
            "unmapped": diagnostics.unmapped.len(),
            "conflicts": diagnostics.conflicts.len(),
        },
    })
}

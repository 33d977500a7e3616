//! The evaluation pipeline.
//!
//! Stage order is fixed: decode → normalize (classification folded in) →
//! deduplicate → score → gate → render. Each stage is a pure function over
//! in-memory values; `run_pipeline` only wires them together.

pub mod classify;
pub mod dedup;
pub mod gate;
pub mod normalize;
pub mod report;
pub mod score;

use crate::core::config::EngineConfig;
use crate::core::input::InputDocument;
use crate::core::model::RawRecord;
use normalize::{NormalizeContext, UnparsedInput};
use report::{Diagnostics, Report};

/// Evaluate one input document against a configuration.
///
/// Severity maps and policy carried by the document are layered over `config`.
/// Never fails: per-record problems end up in the report.
pub fn run_pipeline(input: &InputDocument, config: &EngineConfig) -> Report {
    let effective = config
        .clone()
        .with_overrides(input.severity_maps.as_ref(), input.policy.as_ref());
    evaluate_values(&input.records, &effective)
}

/// Evaluate raw JSON record values with an already-effective configuration.
pub fn evaluate_values(values: &[serde_json::Value], config: &EngineConfig) -> Report {
    let mut unparsed = Vec::new();
    let mut decoded: Vec<RawRecord> = Vec::with_capacity(values.len());
    // Position of each decoded record in the original input.
    let mut origin: Vec<usize> = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        match RawRecord::from_value(value) {
            Ok(record) => {
                decoded.push(record);
                origin.push(index);
            }
            Err(error) => {
                tracing::warn!(index, %error, "record could not be decoded");
                unparsed.push(UnparsedInput {
                    index,
                    locator: locator_from_value(value),
                    error,
                });
            }
        }
    }

    evaluate_decoded(&decoded, &origin, unparsed, values.len(), config)
}

/// Evaluate already-decoded records.
pub fn evaluate_records(records: &[RawRecord], config: &EngineConfig) -> Report {
    let origin: Vec<usize> = (0..records.len()).collect();
    evaluate_decoded(records, &origin, Vec::new(), records.len(), config)
}

fn evaluate_decoded(
    records: &[RawRecord],
    origin: &[usize],
    mut unparsed: Vec<UnparsedInput>,
    input_count: usize,
    config: &EngineConfig,
) -> Report {
    let mut normalized = normalize::normalize(records, NormalizeContext::new(config));
    for entry in normalized.unparsed {
        unparsed.push(UnparsedInput {
            index: origin[entry.index],
            ..entry
        });
    }
    unparsed.sort_by_key(|u| u.index);
    for entry in normalized.unmapped.iter_mut() {
        entry.index = origin[entry.index];
    }

    let deduped = dedup::deduplicate(normalized.records);
    let summary = score::score(&deduped.records);
    let decision = gate::evaluate(&summary, &config.policy);

    tracing::debug!(
        evaluated = deduped.records.len(),
        aggregate = %summary.aggregate_level,
        decision = %decision.outcome,
        fired = decision.fired_rules.len(),
        "evaluation complete"
    );

    report::render(
        &deduped.records,
        &summary,
        &decision,
        Diagnostics {
            input_count,
            unparsed,
            unmapped: normalized.unmapped,
            conflicts: deduped.conflicts,
        },
        config.top_n,
    )
}

fn locator_from_value(value: &serde_json::Value) -> Option<String> {
    ["address", "resourceOrFile"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(String::from)
}

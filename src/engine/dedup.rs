//! Collapse records that share an `id` into one logical record.

use crate::core::error::RecordError;
use crate::core::model::{Category, Locator, NormalizedRecord};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Records that share an `id` but were classified differently. The whole
/// group is withheld from scoring and surfaced for review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: String,
    pub locator: Locator,
    pub signature: String,
    pub categories: Vec<Category>,
    pub provenance: Vec<String>,
}

impl Conflict {
    pub fn error(&self) -> RecordError {
        RecordError::ConflictingClassification {
            id: self.id.clone(),
            categories: self.categories.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    pub records: Vec<NormalizedRecord>,
    pub conflicts: Vec<Conflict>,
}

struct Group {
    merged: NormalizedRecord,
    categories: Vec<Category>,
}

/// Group by `id` and merge each group: severity is the maximum, provenance
/// and sensitive fields are unions, everything else comes from the first
/// record seen. Output keeps first-seen order.
pub fn deduplicate(records: Vec<NormalizedRecord>) -> DedupOutcome {
    let input = records.len();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<Group> = Vec::new();

    for record in records {
        match index.get(&record.id) {
            Some(&slot) => merge_into(&mut groups[slot], record),
            None => {
                index.insert(record.id.clone(), groups.len());
                groups.push(Group {
                    categories: vec![record.category],
                    merged: record,
                });
            }
        }
    }

    let mut outcome = DedupOutcome::default();
    for group in groups {
        if group.categories.len() > 1 {
            let mut categories = group.categories;
            categories.sort();
            let conflict = Conflict {
                id: group.merged.id,
                locator: group.merged.locator,
                signature: group.merged.signature,
                categories,
                provenance: group.merged.provenance,
            };
            tracing::warn!(id = %conflict.id, locator = %conflict.locator, "{}", conflict.error());
            outcome.conflicts.push(conflict);
        } else {
            outcome.records.push(group.merged);
        }
    }

    tracing::debug!(
        input,
        unique = outcome.records.len(),
        conflicts = outcome.conflicts.len(),
        "dedup complete"
    );
    outcome
}

fn merge_into(group: &mut Group, record: NormalizedRecord) {
    if !group.categories.contains(&record.category) {
        group.categories.push(record.category);
    }
    let merged = &mut group.merged;
    merged.severity = merged.severity.max(record.severity);
    for tool in record.provenance {
        if !merged.provenance.contains(&tool) {
            merged.provenance.push(tool);
        }
    }
    merged
        .sensitive_fields_touched
        .extend(record.sensitive_fields_touched);
    if merged.message.is_none() {
        merged.message = record.message;
    }
    if merged.resource_type.is_none() {
        merged.resource_type = record.resource_type;
    }
    if merged.cost_delta.is_none() {
        merged.cost_delta = record.cost_delta;
    }
}

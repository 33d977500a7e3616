//! Risk summary over the deduplicated record set.

use crate::core::model::{Category, NormalizedRecord, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sum of the externally supplied `costDelta` annotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub total_delta: f64,
    pub priced_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    /// Every tier is present, zero or not.
    pub counts: BTreeMap<Severity, usize>,
    pub counts_by_category: BTreeMap<Category, usize>,
    pub aggregate_level: Severity,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostSummary>,
}

impl RiskSummary {
    pub fn count(&self, severity: Severity) -> usize {
        self.counts.get(&severity).copied().unwrap_or(0)
    }

    /// Records at `severity` or any stricter tier.
    pub fn count_at_or_above(&self, severity: Severity) -> usize {
        self.counts
            .iter()
            .filter(|(tier, _)| **tier >= severity)
            .map(|(_, count)| count)
            .sum()
    }
}

pub fn score(records: &[NormalizedRecord]) -> RiskSummary {
    let mut counts: BTreeMap<Severity, usize> =
        Severity::DESCENDING.iter().map(|s| (*s, 0)).collect();
    let mut counts_by_category: BTreeMap<Category, usize> = BTreeMap::new();
    let mut total_delta = 0.0;
    let mut priced_records = 0;

    for record in records {
        *counts.entry(record.severity).or_default() += 1;
        *counts_by_category.entry(record.category).or_default() += 1;
        if let Some(delta) = record.cost_delta {
            total_delta += delta;
            priced_records += 1;
        }
    }

    let aggregate_level = records
        .iter()
        .map(|r| r.severity)
        .max()
        .unwrap_or(Severity::Info);

    RiskSummary {
        counts,
        counts_by_category,
        aggregate_level,
        total: records.len(),
        cost: (priced_records > 0).then_some(CostSummary {
            total_delta,
            priced_records,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Locator, RecordKind};
    use std::collections::BTreeSet;

    fn record(severity: Severity, category: Category, cost: Option<f64>) -> NormalizedRecord {
        NormalizedRecord {
            id: format!("{:?}{:?}", severity, category),
            kind: if category.is_change() {
                RecordKind::Change
            } else {
                RecordKind::Finding
            },
            severity,
            category,
            locator: Locator::parse("x", None),
            signature: "s".to_string(),
            resource_type: None,
            message: None,
            sensitive_fields_touched: BTreeSet::new(),
            provenance: vec!["t".to_string()],
            cost_delta: cost,
        }
    }

    #[test]
    fn test_empty_set_is_info() {
        let summary = score(&[]);
        assert_eq!(summary.aggregate_level, Severity::Info);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.counts.len(), 5);
        assert!(summary.cost.is_none());
    }

    #[test]
    fn test_counts_and_aggregate() {
        let summary = score(&[
            record(Severity::High, Category::Destroy, None),
            record(Severity::Low, Category::Compliance, None),
            record(Severity::High, Category::Secret, None),
        ]);
        assert_eq!(summary.aggregate_level, Severity::High);
        assert_eq!(summary.count(Severity::High), 2);
        assert_eq!(summary.count(Severity::Critical), 0);
        assert_eq!(summary.count_at_or_above(Severity::Low), 3);
        assert_eq!(summary.count_at_or_above(Severity::Critical), 0);
        assert_eq!(summary.counts_by_category[&Category::Secret], 1);
    }

    #[test]
    fn test_cost_is_summed_not_estimated() {
        let summary = score(&[
            record(Severity::Info, Category::Add, Some(42.5)),
            record(Severity::High, Category::Destroy, Some(-12.5)),
            record(Severity::Medium, Category::Modify, None),
        ]);
        let cost = summary.cost.unwrap();
        assert_eq!(cost.total_delta, 30.0);
        assert_eq!(cost.priced_records, 2);
    }

    #[test]
    fn test_summary_serializes_uppercase_tiers() {
        let summary = score(&[record(Severity::Critical, Category::Replace, None)]);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["aggregateLevel"], "CRITICAL");
        assert_eq!(value["counts"]["CRITICAL"], 1);
        assert_eq!(value["countsByCategory"]["replace"], 1);
    }
}

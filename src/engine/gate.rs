//! Gate evaluation: apply the ordered policy rules to a risk summary.

use crate::core::config::{Policy, PolicyRule, RuleAction};
use crate::engine::score::RiskSummary;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOutcome {
    Pass,
    Block,
}

impl GateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule whose threshold was exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiredRule {
    /// Position of the rule in the policy, in declaration order.
    pub index: usize,
    pub rule: PolicyRule,
    /// Records at the rule's severity or stricter.
    pub observed: usize,
}

impl FiredRule {
    pub fn describe(&self) -> String {
        format!(
            "rule {} ({}): {} record(s) at {} or above exceeds maxCount {}",
            self.index, self.rule.action, self.observed, self.rule.severity, self.rule.max_count
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub outcome: GateOutcome,
    pub fired_rules: Vec<FiredRule>,
}

impl GateDecision {
    /// Process exit status for CI: 0 on pass, 1 on block.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            GateOutcome::Pass => 0,
            GateOutcome::Block => 1,
        }
    }

    pub fn blocking_rules(&self) -> impl Iterator<Item = &FiredRule> {
        self.fired_rules
            .iter()
            .filter(|f| f.rule.action == RuleAction::Block)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FiredRule> {
        self.fired_rules
            .iter()
            .filter(|f| f.rule.action == RuleAction::Warn)
    }
}

/// Evaluate every rule in order and collect all that fire. Any fired `block`
/// rule blocks; fired `warn` rules are reported but never block.
pub fn evaluate(summary: &RiskSummary, policy: &Policy) -> GateDecision {
    let fired_rules: Vec<FiredRule> = policy
        .rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            let observed = summary.count_at_or_above(rule.severity);
            (observed > rule.max_count).then(|| FiredRule {
                index,
                rule: rule.clone(),
                observed,
            })
        })
        .collect();

    let outcome = if fired_rules
        .iter()
        .any(|f| f.rule.action == RuleAction::Block)
    {
        GateOutcome::Block
    } else {
        GateOutcome::Pass
    };

    for fired in &fired_rules {
        tracing::info!(outcome = %outcome, "{}", fired.describe());
    }
    GateDecision {
        outcome,
        fired_rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Severity;
    use std::collections::BTreeMap;

    fn summary(pairs: &[(Severity, usize)]) -> RiskSummary {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::DESCENDING.iter().map(|s| (*s, 0)).collect();
        for (severity, count) in pairs {
            counts.insert(*severity, *count);
        }
        let total = counts.values().sum();
        let aggregate_level = counts
            .iter()
            .filter(|(_, c)| **c > 0)
            .map(|(s, _)| *s)
            .max()
            .unwrap_or(Severity::Info);
        RiskSummary {
            counts,
            counts_by_category: BTreeMap::new(),
            aggregate_level,
            total,
            cost: None,
        }
    }

    fn rule(severity: Severity, max_count: usize, action: RuleAction) -> PolicyRule {
        PolicyRule {
            severity,
            max_count,
            action,
        }
    }

    #[test]
    fn test_single_critical_blocks() {
        let policy = Policy {
            rules: vec![rule(Severity::Critical, 0, RuleAction::Block)],
        };
        let decision = evaluate(&summary(&[(Severity::Critical, 1)]), &policy);
        assert_eq!(decision.outcome, GateOutcome::Block);
        assert_eq!(decision.fired_rules.len(), 1);
        assert_eq!(decision.fired_rules[0].index, 0);
        assert_eq!(decision.exit_code(), 1);
    }

    #[test]
    fn test_under_threshold_passes() {
        let policy = Policy {
            rules: vec![rule(Severity::High, 5, RuleAction::Block)],
        };
        let decision = evaluate(&summary(&[(Severity::High, 3)]), &policy);
        assert_eq!(decision.outcome, GateOutcome::Pass);
        assert!(decision.fired_rules.is_empty());
        assert_eq!(decision.exit_code(), 0);
    }

    #[test]
    fn test_stricter_tiers_count_toward_lower_rules() {
        let policy = Policy {
            rules: vec![rule(Severity::Medium, 2, RuleAction::Block)],
        };
        let decision = evaluate(
            &summary(&[(Severity::Critical, 1), (Severity::High, 1), (Severity::Medium, 1)]),
            &policy,
        );
        assert_eq!(decision.outcome, GateOutcome::Block);
        assert_eq!(decision.fired_rules[0].observed, 3);
    }

    #[test]
    fn test_all_fired_rules_are_collected() {
        let policy = Policy {
            rules: vec![
                rule(Severity::Low, 0, RuleAction::Warn),
                rule(Severity::Critical, 0, RuleAction::Block),
                rule(Severity::High, 0, RuleAction::Block),
                rule(Severity::Info, 100, RuleAction::Block),
            ],
        };
        let decision = evaluate(&summary(&[(Severity::Critical, 1)]), &policy);
        let indexes: Vec<usize> = decision.fired_rules.iter().map(|f| f.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(decision.blocking_rules().count(), 2);
        assert_eq!(decision.warnings().count(), 1);
    }

    #[test]
    fn test_warn_rules_do_not_block() {
        let policy = Policy {
            rules: vec![rule(Severity::Medium, 0, RuleAction::Warn)],
        };
        let decision = evaluate(&summary(&[(Severity::High, 4)]), &policy);
        assert_eq!(decision.outcome, GateOutcome::Pass);
        assert_eq!(decision.fired_rules.len(), 1);
    }

    #[test]
    fn test_empty_policy_passes() {
        let decision = evaluate(&summary(&[(Severity::Critical, 9)]), &Policy::default());
        assert_eq!(decision.outcome, GateOutcome::Pass);
    }
}

//! Human-facing report rendering: terminal text and Markdown.
//!
//! Both renderers read the structured `Report` only; nothing here changes
//! the decision. Long messages are collapsed to one bounded line.

use crate::core::config::RuleAction;
use crate::core::model::{NormalizedRecord, Severity};
use crate::engine::gate::GateOutcome;
use crate::engine::report::Report;
use colored::{ColoredString, Colorize};
use std::fmt::Write;

const MESSAGE_WIDTH: usize = 96;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Render up to `max_items` messages with compact formatting.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let shown = messages
        .iter()
        .take(max_items)
        .map(|m| compact_line(m, max_chars))
        .collect::<Vec<_>>()
        .join(" | ");
    if messages.len() > max_items {
        format!("{} (+{} more)", shown, messages.len() - max_items)
    } else {
        shown
    }
}

fn paint_severity(severity: Severity) -> ColoredString {
    let label = severity.as_str();
    match severity {
        Severity::Critical => label.bright_red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.bright_blue(),
        Severity::Info => label.dimmed(),
    }
}

fn record_line(record: &NormalizedRecord) -> String {
    let message = record
        .message
        .as_deref()
        .map(|m| compact_line(m, MESSAGE_WIDTH))
        .unwrap_or_default();
    format!(
        "{} [{}] {} {} ({})",
        record.locator,
        record.category,
        record.signature,
        message,
        record.provenance.join(", ")
    )
}

/// Terminal rendering. Colors follow `colored`'s global override, so callers
/// disable them with `colored::control::set_override(false)`.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let verdict = match report.decision {
        GateOutcome::Pass => "✓ PASS".bright_green().bold(),
        GateOutcome::Block => "✗ BLOCK".bright_red().bold(),
    };
    let _ = writeln!(
        out,
        "{}  aggregate {}  ({} evaluated of {} input records)",
        verdict,
        paint_severity(report.aggregate_level),
        report.metadata.evaluated_count,
        report.metadata.input_count
    );

    let counts: Vec<String> = Severity::DESCENDING
        .iter()
        .map(|s| format!("{} {}", paint_severity(*s), report.summary.count(*s)))
        .collect();
    let _ = writeln!(out, "  {}", counts.join("  "));
    if let Some(cost) = &report.summary.cost {
        let _ = writeln!(
            out,
            "  cost delta {:+.2} across {} priced change(s)",
            cost.total_delta, cost.priced_records
        );
    }

    if !report.fired_rules.is_empty() {
        let _ = writeln!(out, "\n{}", "Fired rules".bright_white().bold());
        for fired in &report.fired_rules {
            let glyph = match fired.rule.action {
                RuleAction::Block => "✗".bright_red(),
                RuleAction::Warn => "⚠".yellow(),
            };
            let _ = writeln!(out, "  {} {}", glyph, fired.describe());
        }
    }

    if !report.top_findings.is_empty() {
        let _ = writeln!(out, "\n{}", "Top findings".bright_white().bold());
        for record in &report.top_findings {
            let _ = writeln!(
                out,
                "  {:<8} {}",
                paint_severity(record.severity),
                record_line(record)
            );
        }
    }

    if !report.conflicts.is_empty() {
        let _ = writeln!(out, "\n{}", "Classification conflicts".bright_red().bold());
        for conflict in &report.conflicts {
            let _ = writeln!(
                out,
                "  {} {} ({})",
                "⚠".yellow(),
                conflict.error(),
                conflict.provenance.join(", ")
            );
        }
    }

    if !report.metadata.warnings.is_empty() {
        let _ = writeln!(out, "\n{}", "Warnings".yellow().bold());
        for warning in &report.metadata.warnings {
            let _ = writeln!(out, "  {} {}", "⚠".yellow(), compact_line(warning, MESSAGE_WIDTH * 2));
        }
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Markdown summary suitable for a pull/merge request comment body.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    let verdict = match report.decision {
        GateOutcome::Pass => "✅ **PASS**",
        GateOutcome::Block => "⛔ **BLOCK**",
    };
    let _ = writeln!(out, "## Risk gate: {}\n", verdict);
    let _ = writeln!(
        out,
        "Aggregate level **{}**, {} of {} input records evaluated.\n",
        report.aggregate_level, report.metadata.evaluated_count, report.metadata.input_count
    );

    let _ = writeln!(out, "| Severity | Count |\n|---|---:|");
    for severity in Severity::DESCENDING {
        let _ = writeln!(out, "| {} | {} |", severity, report.summary.count(severity));
    }
    if let Some(cost) = &report.summary.cost {
        let _ = writeln!(
            out,
            "\nCost delta: **{:+.2}** ({} priced change(s))",
            cost.total_delta, cost.priced_records
        );
    }

    if !report.fired_rules.is_empty() {
        let _ = writeln!(out, "\n### Fired rules\n");
        for fired in &report.fired_rules {
            let _ = writeln!(out, "- {}", fired.describe());
        }
    }

    if !report.top_findings.is_empty() {
        let _ = writeln!(out, "\n### Top findings\n");
        let _ = writeln!(
            out,
            "| Severity | Category | Location | Rule | Message | Reported by |\n|---|---|---|---|---|---|"
        );
        for record in &report.top_findings {
            let message = record
                .message
                .as_deref()
                .map(|m| compact_line(m, MESSAGE_WIDTH))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "| {} | {} | `{}` | `{}` | {} | {} |",
                record.severity,
                record.category,
                record.locator,
                escape_cell(&record.signature),
                escape_cell(&message),
                record.provenance.join(", ")
            );
        }
    }

    if !report.conflicts.is_empty() {
        let _ = writeln!(out, "\n### Classification conflicts\n");
        for conflict in &report.conflicts {
            let _ = writeln!(
                out,
                "- `{}`: {} (reported by {})",
                conflict.locator,
                conflict.error(),
                conflict.provenance.join(", ")
            );
        }
    }

    if !report.metadata.warnings.is_empty() {
        let _ = writeln!(
            out,
            "\n<details><summary>{} warning(s)</summary>\n",
            report.metadata.warnings.len()
        );
        for warning in &report.metadata.warnings {
            let _ = writeln!(out, "- {}", escape_cell(&compact_line(warning, MESSAGE_WIDTH * 2)));
        }
        let _ = writeln!(out, "\n</details>");
    }
    out
}

//! Classification rule tables.
//!
//! Action sets map to exactly four change categories; finding categories come
//! from the closed vocabulary the scanners use. Severity for changes is a
//! fixed internal rule rather than a lookup table.

use crate::core::error::RecordError;
use crate::core::model::{Action, Category, Severity};

/// Parse raw action strings. Unknown strings make the whole set unclassifiable.
pub fn parse_actions(raw: &[String]) -> Result<Vec<Action>, RecordError> {
    if raw.is_empty() {
        return Err(RecordError::invalid("actions is empty"));
    }
    raw.iter()
        .map(|a| {
            Action::parse(a).ok_or_else(|| RecordError::UnknownActionSet {
                actions: raw.to_vec(),
            })
        })
        .collect()
}

/// `{create}` → Add, `{delete}` → Destroy, `{update}` → Modify,
/// `{create, delete}` in either order → Replace. Anything else is an error.
pub fn classify_actions(actions: &[Action]) -> Result<Category, RecordError> {
    let has = |a: Action| actions.contains(&a);
    let shape = (
        has(Action::Create),
        has(Action::Update),
        has(Action::Delete),
        has(Action::NoOp),
    );
    match shape {
        (true, false, false, false) => Ok(Category::Add),
        (false, true, false, false) => Ok(Category::Modify),
        (false, false, true, false) => Ok(Category::Destroy),
        (true, false, true, false) => Ok(Category::Replace),
        _ => Err(RecordError::UnknownActionSet {
            actions: describe(actions),
        }),
    }
}

/// Category for a finding record. A missing category is `Other`.
pub fn classify_finding(raw: Option<&str>) -> Result<Category, RecordError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Category::Other),
        Some(value) => Category::parse_finding(value).ok_or_else(|| {
            RecordError::invalid(format!(
                "unknown finding category '{}': expected secret|pii|compliance|non-inclusive-language|other",
                value
            ))
        }),
    }
}

/// Severity of a change: destroy/replace start at HIGH and escalate to
/// CRITICAL on sensitive or stateful resources; modify starts at MEDIUM and
/// escalates to HIGH on sensitive fields; add is INFO.
pub fn change_severity(category: Category, touches_sensitive: bool, stateful: bool) -> Severity {
    match category {
        Category::Destroy | Category::Replace if touches_sensitive || stateful => Severity::Critical,
        Category::Destroy | Category::Replace => Severity::High,
        Category::Modify if touches_sensitive => Severity::High,
        Category::Modify => Severity::Medium,
        Category::Add => Severity::Info,
        _ => Severity::Medium,
    }
}

/// Dedup signature for a change: the category stands in for the canonical action set.
pub fn change_signature(category: Category) -> String {
    format!("change:{}", category.as_str())
}

fn describe(actions: &[Action]) -> Vec<String> {
    let mut names: Vec<&str> = actions
        .iter()
        .map(|a| match a {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::NoOp => "no-op",
        })
        .collect();
    names.dedup();
    names.into_iter().map(String::from).collect()
}

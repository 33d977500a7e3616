//! Compile-time embedded assets.
//!
//! The default configuration is baked into the binary so an evaluation never
//! depends on files outside the invocation's inputs.

/// Built-in configuration (`defaults/riskgate.toml`).
pub const DEFAULT_CONFIG: &str = include_str!("../../defaults/riskgate.toml");

/// Return an embedded asset by its repository-relative path.
pub fn get_embedded(path: &str) -> Option<&'static str> {
    match path.strip_prefix("./").unwrap_or(path) {
        "defaults/riskgate.toml" => Some(DEFAULT_CONFIG),
        _ => None,
    }
}

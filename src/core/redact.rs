//! Secret redaction for finding messages.
//!
//! Secret scanners frequently quote the match in their message. Reports end
//! up in PR comments and CI logs, so messages are scrubbed before they enter
//! a normalized record.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::sync::LazyLock;

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // PEM private keys (full block first, then a bare header)
        (
            Regex::new(r"-----BEGIN (?:RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----[\s\S]*?-----END (?:RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----").unwrap(),
            "[PEM_KEY_REDACTED]",
        ),
        (
            Regex::new(r"-----BEGIN (?:RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----").unwrap(),
            "[PEM_KEY_REDACTED]",
        ),
        // AWS access key id
        (
            Regex::new(r"(A3T[A-Z0-9]|AKIA|AGPA|AIDA|AROA|AIPA|ANPA|ANVA|ASIA)[0-9A-Z]{16}")
                .unwrap(),
            "[AWS_KEY_REDACTED]",
        ),
        // Vault service/batch/recovery tokens
        (
            Regex::new(r"\bhv[sbr]\.[A-Za-z0-9_\-]{20,}").unwrap(),
            "[VAULT_TOKEN_REDACTED]",
        ),
        // GitHub tokens
        (
            Regex::new(r"(ghp|gho|ghu|ghs|ghr)_[a-zA-Z0-9_]{36,255}").unwrap(),
            "[GITHUB_TOKEN_REDACTED]",
        ),
        // Slack tokens
        (
            Regex::new(r"xox[baprs]-[A-Za-z0-9\-]{10,}").unwrap(),
            "[SLACK_TOKEN_REDACTED]",
        ),
        (
            Regex::new(r"(?i)bearer\s+[a-zA-Z0-9_\-\.]{20,}").unwrap(),
            "[BEARER_REDACTED]",
        ),
        (
            Regex::new(r#"(?i)(postgres|mysql|mongodb|redis)://[^\s'"]+:[^\s'"]+@[^\s'"]+"#)
                .unwrap(),
            "[CONNECTION_STRING_REDACTED]",
        ),
        (
            Regex::new(
                r#"(?i)(api[_-]?key|apikey|api_secret|secret[_-]?key)['"]?\s*[:=]\s*['"]?[a-zA-Z0-9_\-]{20,}['"]?"#,
            )
            .unwrap(),
            "[API_KEY_REDACTED]",
        ),
        (
            Regex::new(r#"(?i)(password|passwd|pwd)['"]?\s*[:=]\s*['"]?[^\s'"]{8,}['"]?"#)
                .unwrap(),
            "[PASSWORD_REDACTED]",
        ),
    ]
});

/// Replace anything that looks like a credential. Borrowed input is returned
/// untouched when nothing matches.
pub fn redact_message(input: &str) -> Cow<'_, str> {
    let mut result = Cow::Borrowed(input);
    for (pattern, replacement) in SECRET_PATTERNS.iter() {
        if pattern.is_match(&result) {
            result = Cow::Owned(pattern.replace_all(&result, *replacement).into_owned());
        }
    }
    result
}

pub fn contains_secret(input: &str) -> bool {
    SECRET_PATTERNS.iter().any(|(pattern, _)| pattern.is_match(input))
}

/// Stand-in for a sensitive value: comparable for equality, reveals nothing.
pub fn sensitive_digest(value: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

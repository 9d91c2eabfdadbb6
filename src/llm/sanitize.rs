//! SQL sanitizer and read-only guard
//!
//! Model output is untrusted text. `clean` strips generation artifacts
//! without parsing SQL; `assert_safe` enforces the single-SELECT policy on
//! the cleaned text before anything reaches the executor.

use crate::error::{PipelineError, PipelineResult};
use regex::Regex;
use std::sync::OnceLock;

fn sql_fence_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```sql\n?").expect("fence opener pattern"))
}

fn bare_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```\n?").expect("bare fence pattern"))
}

fn forbidden_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(insert|update|delete|drop|alter|create|truncate|merge|exec|execute|grant|revoke)\b",
        )
        .expect("keyword pattern")
    })
}

/// Strip markdown fencing and backticks, then trim
///
/// Purely textual and idempotent; cleaning an already-clean string is a
/// no-op.
pub fn clean(sql: &str) -> String {
    let cleaned = sql_fence_opener().replace_all(sql, "");
    let cleaned = bare_fence().replace_all(&cleaned, "");
    let cleaned = cleaned.replace('`', "");
    cleaned.trim().to_string()
}

/// Reject anything but a single read-only SELECT statement
///
/// Runs on cleaned text. The first failing check names the error: SELECT
/// prefix, then statement count, then forbidden keywords.
pub fn assert_safe(sql: &str) -> PipelineResult<()> {
    let trimmed = sql.trim();

    let starts_with_select = trimmed
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("select"))
        .unwrap_or(false);
    if !starts_with_select {
        return Err(PipelineError::NotSelect);
    }

    // One trailing semicolon is tolerated; any other means stacked statements
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
    if body.contains(';') {
        return Err(PipelineError::MultipleStatements);
    }

    if let Some(found) = forbidden_keyword().find(body) {
        return Err(PipelineError::forbidden_keyword(
            found.as_str().to_lowercase(),
        ));
    }

    Ok(())
}

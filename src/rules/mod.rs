//! Sliding-window rule data model: `RateLimitRule`, `RuleSet`, and the
//! parsing/validation of the `{ rules: [...] }` config record (§3, §4.2).

use serde::{Deserialize, Serialize};

use crate::core::error::AppError;

/// A single sliding-window constraint: at most `points` admissions within a
/// trailing `duration`-second window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub points: u32,
    pub duration: u32,
}

impl RateLimitRule {
    pub fn duration_ms(&self) -> i64 {
        i64::from(self.duration) * 1000
    }
}

/// An ordered, non-empty sequence of rules evaluated conjunctively per request.
/// Order is significant only as the tie-break described in §4.4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet(Vec<RateLimitRule>);

impl RuleSet {
    pub fn rules(&self) -> &[RateLimitRule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for RuleSet {
    type Output = RateLimitRule;

    fn index(&self, index: usize) -> &RateLimitRule {
        &self.0[index]
    }
}

/// Wire shape of a config record: `{ "rules": [{ "points": .., "duration": .. }, ...] }`.
#[derive(Debug, Deserialize)]
struct ConfigRecord {
    rules: Vec<RawRule>,
}

/// Intentionally permissive on the wire (accepts any JSON number) so that
/// validation — not parsing — is the place non-integral or non-positive
/// values get rejected, per the open question in §9.
#[derive(Debug, Deserialize)]
struct RawRule {
    points: serde_json::Number,
    duration: serde_json::Number,
}

/// Parse and validate a config record string into a `RuleSet`.
///
/// Returns `ConfigMalformed` if the value isn't valid JSON matching the
/// `{ rules: [...] }` shape, or `ConfigInvalid` if it parses but violates
/// §4.2's validation rules (empty array, non-positive or non-integral
/// `points`/`duration`).
pub fn parse_rule_set(identifier: &str, raw: &str) -> Result<RuleSet, AppError> {
    let record: ConfigRecord = serde_json::from_str(raw)
        .map_err(|e| AppError::ConfigMalformed(format!("{identifier}: {e}")))?;

    if record.rules.is_empty() {
        return Err(AppError::ConfigInvalid(format!(
            "{identifier}: rule set must contain at least one rule"
        )));
    }

    let mut rules = Vec::with_capacity(record.rules.len());
    for (i, raw_rule) in record.rules.into_iter().enumerate() {
        let points = positive_integer(&raw_rule.points)
            .ok_or_else(|| invalid(identifier, i, "points", &raw_rule.points))?;
        let duration = positive_integer(&raw_rule.duration)
            .ok_or_else(|| invalid(identifier, i, "duration", &raw_rule.duration))?;
        rules.push(RateLimitRule { points, duration });
    }

    Ok(RuleSet(rules))
}

fn invalid(identifier: &str, index: usize, field: &str, value: &serde_json::Number) -> AppError {
    AppError::ConfigInvalid(format!(
        "{identifier}: rule[{index}].{field} must be a positive integer, got {value}"
    ))
}

fn positive_integer(n: &serde_json::Number) -> Option<u32> {
    let v = n.as_f64()?;
    if v <= 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
        return None;
    }
    Some(v as u32)
}

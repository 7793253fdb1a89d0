//! Structural validation of raw stored records
//!
//! Validators work on `serde_json::Value` rather than typed structs so that a record
//! which would deserialize by accident (coerced or defaulted fields) is still caught.
//! Each validator returns the list of issues found; an empty list means valid.

use super::envelope::RecordKind;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

/// Default tolerance for timestamps slightly in the future
pub const DEFAULT_CLOCK_SKEW_SECS: i64 = 300;

/// Reference time and tolerance for date checks
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
    pub clock_skew: Duration,
}

impl ValidationContext {
    pub fn new(clock_skew: Duration) -> Self {
        Self::at(Utc::now(), clock_skew)
    }

    pub fn at(now: DateTime<Utc>, clock_skew: Duration) -> Self {
        Self { now, clock_skew }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CLOCK_SKEW_SECS))
    }
}

/// `MAJOR.MINOR.PATCH`, digits only
pub fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

pub fn major_version(version: &str) -> Option<u64> {
    if !is_semver(version) {
        return None;
    }
    version.split('.').next()?.parse().ok()
}

pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Validate a complete raw envelope for record kind `K`
pub fn validate_envelope<K: RecordKind>(value: &Value, ctx: &ValidationContext) -> Vec<String> {
    let Some(envelope) = value.as_object() else {
        return vec!["record is not a JSON object".to_string()];
    };

    let mut issues = Vec::new();

    for field in K::PAYLOAD_FIELDS {
        if !envelope.contains_key(*field) {
            issues.push(format!("missing payload field '{}'", field));
        }
    }

    match envelope.get("timestamp") {
        None => issues.push("missing timestamp".to_string()),
        Some(ts) if parse_timestamp(ts).is_none() => {
            issues.push("timestamp is not a valid date".to_string())
        }
        Some(_) => {}
    }

    for field in ["storageFormatVersion", "contentVersion"] {
        match envelope.get(field).and_then(Value::as_str) {
            None => issues.push(format!("missing {}", field)),
            Some(v) if !is_semver(v) => issues.push(format!("{} '{}' is not semver", field, v)),
            Some(_) => {}
        }
    }

    issues.extend(K::validate_payload(envelope, ctx));
    issues
}

fn non_empty_str(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

fn number_in_range(value: Option<&Value>, min: f64, max: f64) -> bool {
    value
        .and_then(Value::as_f64)
        .is_some_and(|n| n >= min && n <= max)
}

/// Rules for a `Results` object
pub fn validate_results_payload(results: &Value, ctx: &ValidationContext) -> Vec<String> {
    let Some(results) = results.as_object() else {
        return vec!["results is not an object".to_string()];
    };

    let mut issues = Vec::new();

    match results.get("careerPaths").and_then(Value::as_array) {
        None => issues.push("careerPaths is not a list".to_string()),
        Some(paths) if paths.is_empty() => issues.push("careerPaths is empty".to_string()),
        Some(paths) => {
            for (idx, path) in paths.iter().enumerate() {
                if !non_empty_str(path.get("title")) {
                    issues.push(format!("careerPaths[{}] has no title", idx));
                }
                if !number_in_range(path.get("score"), 0.0, 100.0) {
                    issues.push(format!("careerPaths[{}] score is not in 0-100", idx));
                }
                if !non_empty_str(path.get("description")) {
                    issues.push(format!("careerPaths[{}] has no description", idx));
                }
            }
        }
    }

    if !results
        .get("personalityInsight")
        .is_some_and(Value::is_object)
    {
        issues.push("personalityInsight is not an object".to_string());
    }

    if !number_in_range(results.get("confidence"), 0.0, 100.0) {
        issues.push("confidence is not in 0-100".to_string());
    }

    // No upper bound when the skew reaches past the latest representable date
    let latest = ctx.now.checked_add_signed(ctx.clock_skew);
    match results.get("completedAt").and_then(parse_timestamp) {
        None => issues.push("completedAt is not a valid date".to_string()),
        Some(at) if latest.is_some_and(|latest| at > latest) => {
            issues.push("completedAt is in the future".to_string())
        }
        Some(_) => {}
    }

    match results.get("aiAnalysis") {
        None | Some(Value::Null) => {}
        Some(Value::Object(analysis)) => {
            if analysis
                .get("specificOccupations")
                .is_some_and(|o| !o.is_array())
            {
                issues.push("aiAnalysis.specificOccupations is not a list".to_string());
            }
        }
        Some(_) => issues.push("aiAnalysis is not an object".to_string()),
    }

    issues
}

/// Rules for the progress payload fields of an envelope
pub fn validate_progress_payload(envelope: &Map<String, Value>) -> Vec<String> {
    let mut issues = Vec::new();

    match envelope.get("answers") {
        None => {}
        Some(Value::Array(answers)) => {
            for (idx, answer) in answers.iter().enumerate() {
                if !non_empty_str(answer.get("questionId")) {
                    issues.push(format!("answers[{}] has no questionId", idx));
                }
                let value_ok = match answer.get("value") {
                    Some(Value::String(_)) | Some(Value::Number(_)) => true,
                    Some(Value::Array(items)) => items.iter().all(Value::is_string),
                    _ => false,
                };
                if !value_ok {
                    issues.push(format!("answers[{}] has an invalid value", idx));
                }
            }
        }
        Some(_) => issues.push("answers is not a list".to_string()),
    }

    match envelope.get("currentQuestionIndex") {
        None => {}
        Some(index) => match index.as_i64() {
            Some(i) if i >= -1 => {}
            _ => issues.push("currentQuestionIndex is not an integer >= -1".to_string()),
        },
    }

    issues
}

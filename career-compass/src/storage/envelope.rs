//! Versioned record envelopes
//!
//! Every persisted record is a flat JSON object: the payload fields of its kind plus
//! `timestamp`, `storageFormatVersion` and `contentVersion`.
//!
//! ```json
//! {
//!   "answers": [{"questionId": "work_pace", "value": 5}],
//!   "currentQuestionIndex": 3,
//!   "timestamp": "2024-05-01T10:00:00Z",
//!   "storageFormatVersion": "1.0.0",
//!   "contentVersion": "1.0.0"
//! }
//! ```

use super::validation::{self, ValidationContext};
use career_compass_sdk::{Answer, Results};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version of the envelope layout itself
pub const STORAGE_FORMAT_VERSION: &str = "1.0.0";

/// Envelope around one persisted payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord<P> {
    #[serde(flatten)]
    pub payload: P,
    pub timestamp: DateTime<Utc>,
    pub storage_format_version: String,
    /// Version of the question bank the payload was produced against
    pub content_version: String,
}

impl<P> StoredRecord<P> {
    pub fn new(payload: P, content_version: impl Into<String>) -> Self {
        Self {
            payload,
            timestamp: Utc::now(),
            storage_format_version: STORAGE_FORMAT_VERSION.to_string(),
            content_version: content_version.into(),
        }
    }
}

/// In-progress answers plus the navigation position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub answers: Vec<Answer>,
    /// -1 before the first question is shown
    pub current_question_index: i64,
}

/// Finalized results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsRecord {
    pub results: Results,
}

/// A payload kind with its own structural validator
///
/// The envelope checks are shared; only the payload rules differ per kind.
pub trait RecordKind: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync {
    /// Name used in logs and error details
    const LABEL: &'static str;
    /// Top-level fields the payload contributes to the envelope
    const PAYLOAD_FIELDS: &'static [&'static str];

    /// Structural issues in the payload part of a raw envelope
    fn validate_payload(envelope: &Map<String, Value>, ctx: &ValidationContext) -> Vec<String>;
}

impl RecordKind for ProgressRecord {
    const LABEL: &'static str = "progress";
    const PAYLOAD_FIELDS: &'static [&'static str] = &["answers", "currentQuestionIndex"];

    fn validate_payload(envelope: &Map<String, Value>, _ctx: &ValidationContext) -> Vec<String> {
        validation::validate_progress_payload(envelope)
    }
}

impl RecordKind for ResultsRecord {
    const LABEL: &'static str = "results";
    const PAYLOAD_FIELDS: &'static [&'static str] = &["results"];

    fn validate_payload(envelope: &Map<String, Value>, ctx: &ValidationContext) -> Vec<String> {
        match envelope.get("results") {
            Some(results) => validation::validate_results_payload(results, ctx),
            None => Vec::new(),
        }
    }
}

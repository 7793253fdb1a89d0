//! Shared contract types for the career-compass assessment engine.
//!
//! This crate holds the data model that crosses component boundaries (questions,
//! answers, archetypes, results) together with the collaborator traits the engine
//! consumes: an [`EnrichmentService`] for optional text analysis, a [`KeyValueStore`]
//! backend for persistence, and an [`ErrorReporter`] for centralized error logging.

// Re-export async trait for convenience
pub use async_trait::async_trait;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Questions
// ============================================================================

/// Question category used for grouping in the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Personality,
    WorkStyle,
    Values,
    Motivation,
    Relationships,
    Environment,
    Skills,
    Reflection,
}

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Choice,
    Scale,
    Text,
    Multiselect,
}

/// Static question definition, loaded once at startup and never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category: QuestionCategory,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,

    /// Ordered options for choice and multiselect questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_max: Option<i64>,

    /// Label shown at the low end of a scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    /// Label shown at the high end of a scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,

    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

// ============================================================================
// Answers
// ============================================================================

/// Raw answer value as produced by the UI
///
/// Scale answers are numbers, choice and text answers are strings, multiselect
/// answers are lists of option strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// True when the value carries no usable content (blank text, empty list)
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Number(n) => !n.is_finite(),
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::List(items) => items.is_empty(),
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<i32> for AnswerValue {
    fn from(value: i32) -> Self {
        AnswerValue::Number(f64::from(value))
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::List(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(value: Vec<&str>) -> Self {
        AnswerValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// One answer, keyed by question id (last write wins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Archetypes
// ============================================================================

/// Static career archetype definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub work_environment: String,
    #[serde(default)]
    pub typical_roles: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
}

/// Archetype augmented with its computed score for one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeView {
    #[serde(flatten)]
    pub archetype: ArchetypeDefinition,

    /// Normalized score, 0-100
    pub score: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
}

impl ArchetypeView {
    pub fn new(archetype: ArchetypeDefinition, score: u32) -> Self {
        Self {
            archetype,
            score,
            ai_reasoning: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.archetype.id
    }

    pub fn title(&self) -> &str {
        &self.archetype.title
    }
}

// ============================================================================
// Results
// ============================================================================

/// Qualitative insights derived from scale and choice answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityInsight {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_growth: Vec<String>,
    #[serde(default)]
    pub natural_tendencies: Vec<String>,
    #[serde(default)]
    pub avoidance_areas: Vec<String>,
    #[serde(default)]
    pub relationship_styles: Vec<String>,
    #[serde(default)]
    pub working_style: String,
    #[serde(default)]
    pub motivators: Vec<String>,
}

/// Top-level sections an enrichment response may carry
pub const ENRICHMENT_SECTIONS: [&str; 5] = [
    "specificOccupations",
    "beliefPatterns",
    "deepPersonality",
    "careerReasoning",
    "developmentPlan",
];

/// Opaque enrichment payload from the external text-analysis service
///
/// Only the presence of known top-level sections is checked; everything else is
/// passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrichmentResult(Map<String, Value>);

impl EnrichmentResult {
    /// Structurally check a raw service response
    ///
    /// A response missing every known section is a failure, not empty data.
    pub fn from_value(value: Value) -> Result<Self, EnrichmentError> {
        let Value::Object(map) = value else {
            return Err(EnrichmentError::MalformedResponse(
                "expected a JSON object".to_string(),
            ));
        };

        if !ENRICHMENT_SECTIONS.iter().any(|s| map.contains_key(*s)) {
            return Err(EnrichmentError::IncompleteResponse);
        }

        if let Some(occupations) = map.get("specificOccupations") {
            if !occupations.is_array() {
                return Err(EnrichmentError::MalformedResponse(
                    "specificOccupations must be a list".to_string(),
                ));
            }
        }

        Ok(Self(map))
    }

    pub fn get(&self, section: &str) -> Option<&Value> {
        self.0.get(section)
    }

    pub fn specific_occupations(&self) -> Option<&Vec<Value>> {
        self.0.get("specificOccupations").and_then(Value::as_array)
    }

    /// Reasoning text for one archetype, if the service provided it
    pub fn career_reasoning(&self, archetype_id: &str) -> Option<&str> {
        self.0
            .get("careerReasoning")?
            .as_object()?
            .get(archetype_id)?
            .as_str()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Final assessment results
///
/// Created once at completion without enrichment, then replaced wholesale when
/// enrichment succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    /// Top archetypes, sorted by descending score
    pub career_paths: Vec<ArchetypeView>,
    pub personality_insight: PersonalityInsight,
    /// Separation heuristic between the top two archetypes, 60-100
    pub confidence: u32,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<EnrichmentResult>,
}

impl Results {
    pub fn top_archetype(&self) -> Option<&ArchetypeView> {
        self.career_paths.first()
    }

    pub fn is_enriched(&self) -> bool {
        self.ai_analysis.is_some()
    }
}

// ============================================================================
// Enrichment collaborator
// ============================================================================

/// Errors surfaced by an enrichment service
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnrichmentError {
    #[error("enrichment service is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("enrichment request timed out")]
    Timeout,

    #[error("enrichment service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("malformed enrichment response: {0}")]
    MalformedResponse(String),

    #[error("enrichment response contained none of the expected sections")]
    IncompleteResponse,
}

/// External text-analysis service used to enrich results
///
/// Implementations own their wall-clock timeout; the engine treats any error as a
/// recoverable outcome.
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn enrich(
        &self,
        answers: &[Answer],
        ranked: &[ArchetypeView],
    ) -> Result<EnrichmentResult, EnrichmentError>;
}

// ============================================================================
// Storage collaborator
// ============================================================================

/// Failure raised by a key-value storage backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

/// Synchronous string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

// ============================================================================
// Error reporting collaborator
// ============================================================================

/// Where an error was observed
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    pub component: &'static str,
    pub operation: String,
    pub key: Option<String>,
}

impl ErrorContext {
    pub fn new(component: &'static str, operation: impl Into<String>) -> Self {
        Self {
            component,
            operation: operation.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Centralized error sink, injected into components that need it
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &dyn std::error::Error, context: &ErrorContext);
}

//! Static questionnaire configuration
//!
//! The question bank, archetype definitions and hand-authored scoring tables ship as
//! YAML files embedded in the binary. They are parsed once at startup and checked for
//! referential integrity before any scoring happens.
//!
//! # Files
//!
//! - `data/questions.yaml` - ordered question bank plus its content version
//! - `data/archetypes.yaml` - archetype definitions, in tie-break order
//! - `data/scoring.yaml` - weight table, choice option scores, direct scale list,
//!   archetype-revealing text prompts and keyword tiers

use career_compass_sdk::{ArchetypeDefinition, Question, QuestionType};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

const QUESTIONS_YAML: &str = include_str!("data/questions.yaml");
const ARCHETYPES_YAML: &str = include_str!("data/archetypes.yaml");
const SCORING_YAML: &str = include_str!("data/scoring.yaml");

/// Lowest weight allowed in the weight table
pub const MIN_WEIGHT: f64 = -2.5;
/// Highest weight allowed in the weight table
pub const MAX_WEIGHT: f64 = 3.5;

/// Errors raised while loading or checking the catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("catalog integrity check failed: {}", .0.join("; "))]
    Integrity(Vec<String>),
}

// ============================================================================
// File formats
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuestionBankFile {
    version: String,
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct ArchetypeFile {
    archetypes: Vec<ArchetypeDefinition>,
}

/// Keyword tiers used to score free text against one archetype
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KeywordTiers {
    /// +1 each
    #[serde(default)]
    pub high: Vec<String>,
    /// +0.5 each
    #[serde(default)]
    pub medium: Vec<String>,
    /// -0.5 each
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Hand-authored scoring configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScoringTables {
    /// archetype id -> question id -> signed weight
    #[serde(default)]
    pub weights: BTreeMap<String, BTreeMap<String, f64>>,

    /// question id -> option text -> base score in [1, 5]
    #[serde(default)]
    pub choice_scores: HashMap<String, HashMap<String, f64>>,

    /// Scale questions whose raw answer is the base score
    #[serde(default)]
    pub direct_scale: HashSet<String>,

    /// Text questions scored against every archetype's keywords
    #[serde(default)]
    pub revealing_text: HashSet<String>,

    /// archetype id -> keyword tiers
    #[serde(default)]
    pub keywords: BTreeMap<String, KeywordTiers>,
}

// ============================================================================
// Catalog
// ============================================================================

/// Immutable questionnaire configuration
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    questions: Vec<Question>,
    archetypes: Vec<ArchetypeDefinition>,
    scoring: ScoringTables,
    question_index: HashMap<String, usize>,
}

impl Catalog {
    /// Load the catalog embedded in the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(QUESTIONS_YAML, ARCHETYPES_YAML, SCORING_YAML)
    }

    /// The embedded catalog, parsed once per process
    pub fn shared() -> Result<Arc<Self>, CatalogError> {
        static SHARED: OnceLock<Arc<Catalog>> = OnceLock::new();

        if let Some(catalog) = SHARED.get() {
            return Ok(catalog.clone());
        }
        let catalog = Arc::new(Self::builtin()?);
        Ok(SHARED.get_or_init(|| catalog).clone())
    }

    /// Parse a catalog from the three YAML documents
    pub fn from_yaml(
        questions_yaml: &str,
        archetypes_yaml: &str,
        scoring_yaml: &str,
    ) -> Result<Self, CatalogError> {
        let bank: QuestionBankFile =
            serde_yaml::from_str(questions_yaml).map_err(|source| CatalogError::Parse {
                file: "questions.yaml",
                source,
            })?;
        let archetypes: ArchetypeFile =
            serde_yaml::from_str(archetypes_yaml).map_err(|source| CatalogError::Parse {
                file: "archetypes.yaml",
                source,
            })?;
        let scoring: ScoringTables =
            serde_yaml::from_str(scoring_yaml).map_err(|source| CatalogError::Parse {
                file: "scoring.yaml",
                source,
            })?;

        Self::new(bank.version, bank.questions, archetypes.archetypes, scoring)
    }

    /// Build a catalog from parts, rejecting it if integrity checks fail
    pub fn new(
        version: impl Into<String>,
        questions: Vec<Question>,
        archetypes: Vec<ArchetypeDefinition>,
        scoring: ScoringTables,
    ) -> Result<Self, CatalogError> {
        let question_index = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.id.clone(), idx))
            .collect();

        let catalog = Self {
            version: version.into(),
            questions,
            archetypes,
            scoring,
            question_index,
        };

        let issues = catalog.integrity_issues();
        if !issues.is_empty() {
            return Err(CatalogError::Integrity(issues));
        }

        tracing::debug!(
            version = %catalog.version,
            questions = catalog.questions.len(),
            archetypes = catalog.archetypes.len(),
            "catalog loaded"
        );

        Ok(catalog)
    }

    /// Content version stamped into persisted records
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.question_index.get(id).map(|&idx| &self.questions[idx])
    }

    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.required)
    }

    pub fn archetypes(&self) -> &[ArchetypeDefinition] {
        &self.archetypes
    }

    pub fn archetype(&self, id: &str) -> Option<&ArchetypeDefinition> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    pub fn scoring(&self) -> &ScoringTables {
        &self.scoring
    }

    /// Collect every referential-integrity violation in the configuration
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id.as_str()) {
                issues.push(format!("duplicate question id '{}'", q.id));
            }
            match q.question_type {
                QuestionType::Choice | QuestionType::Multiselect if q.options.is_empty() => {
                    issues.push(format!("question '{}' has no options", q.id));
                }
                QuestionType::Scale => {
                    if let (Some(min), Some(max)) = (q.scale_min, q.scale_max) {
                        if min >= max {
                            issues.push(format!("question '{}' has an empty scale", q.id));
                        }
                    }
                }
                _ => {}
            }
        }

        let mut archetype_ids = HashSet::new();
        for a in &self.archetypes {
            if !archetype_ids.insert(a.id.as_str()) {
                issues.push(format!("duplicate archetype id '{}'", a.id));
            }
        }

        for (archetype_id, weights) in &self.scoring.weights {
            if !archetype_ids.contains(archetype_id.as_str()) {
                issues.push(format!("weights reference unknown archetype '{}'", archetype_id));
            }
            for (question_id, weight) in weights {
                if self.question(question_id).is_none() {
                    issues.push(format!(
                        "weights for '{}' reference unknown question '{}'",
                        archetype_id, question_id
                    ));
                }
                if !weight.is_finite() || *weight < MIN_WEIGHT || *weight > MAX_WEIGHT {
                    issues.push(format!(
                        "weight {} for '{}'/'{}' is outside [{}, {}]",
                        weight, archetype_id, question_id, MIN_WEIGHT, MAX_WEIGHT
                    ));
                }
            }
        }

        for (question_id, table) in &self.scoring.choice_scores {
            let Some(question) = self.question(question_id) else {
                issues.push(format!("choice scores reference unknown question '{}'", question_id));
                continue;
            };
            if question.question_type != QuestionType::Choice {
                issues.push(format!("choice scores target non-choice question '{}'", question_id));
            }
            for (option, score) in table {
                if !question.options.contains(option) {
                    issues.push(format!(
                        "choice scores for '{}' name unknown option '{}'",
                        question_id, option
                    ));
                }
                if !(1.0..=5.0).contains(score) {
                    issues.push(format!(
                        "choice score {} for '{}' is outside [1, 5]",
                        score, question_id
                    ));
                }
            }
        }

        for question_id in &self.scoring.direct_scale {
            match self.question(question_id) {
                Some(q) if q.question_type == QuestionType::Scale => {}
                Some(_) => issues.push(format!("direct scale entry '{}' is not a scale question", question_id)),
                None => issues.push(format!("direct scale entry '{}' is unknown", question_id)),
            }
        }

        for question_id in &self.scoring.revealing_text {
            match self.question(question_id) {
                Some(q) if q.question_type == QuestionType::Text => {}
                Some(_) => issues.push(format!("revealing text entry '{}' is not a text question", question_id)),
                None => issues.push(format!("revealing text entry '{}' is unknown", question_id)),
            }
        }

        for archetype_id in self.scoring.keywords.keys() {
            if !archetype_ids.contains(archetype_id.as_str()) {
                issues.push(format!("keywords reference unknown archetype '{}'", archetype_id));
            }
        }

        issues
    }
}

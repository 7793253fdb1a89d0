//! Weighted archetype scoring
//!
//! Every answered question that appears in an archetype's weight table contributes
//! `base_score * weight` to that archetype. Raw totals are then min-max normalized to
//! 0-100 across archetypes and the top three are reported, together with a confidence
//! heuristic based on how far the leader is ahead of the runner-up.
//!
//! # Base scores by question type
//!
//! | Type        | Base score                                                         |
//! |-------------|--------------------------------------------------------------------|
//! | choice      | option lookup in the choice score table, 3 when not listed          |
//! | scale       | raw value for direct-mapped questions, else rescaled 1-7 -> 1-5     |
//! | multiselect | 3 when anything is selected, 1 for an empty selection               |
//! | text        | best keyword score across archetypes for revealing prompts, else 4  |
//!
//! Answers whose value does not fit the question type, and scale values outside the
//! question's range, are ignored. Scoring never
//! fails on answer data.
//!
//! The confidence value is a heuristic (`top - second + 70`, clamped to 60-100), not a
//! statistical confidence interval.

use crate::catalog::{Catalog, KeywordTiers};
use career_compass_sdk::{Answer, AnswerValue, ArchetypeView, Question, QuestionType};
use std::collections::HashMap;

/// Number of archetypes reported as career paths
pub const TOP_N: usize = 3;

/// Base score for a choice option without an explicit table entry
pub const NEUTRAL_CHOICE_SCORE: f64 = 3.0;
/// Base score for text prompts that are not archetype-revealing
pub const NEUTRAL_TEXT_SCORE: f64 = 4.0;
/// Normalized score given to every archetype when all raw scores are equal
pub const DEGENERATE_SCORE: u32 = 50;

const DEFAULT_SCALE_MIN: i64 = 1;
const DEFAULT_SCALE_MAX: i64 = 7;

const MULTISELECT_SELECTED: f64 = 3.0;
const MULTISELECT_EMPTY: f64 = 1.0;

const KEYWORD_BASE: f64 = 3.0;
const KEYWORD_HIGH: f64 = 1.0;
const KEYWORD_MEDIUM: f64 = 0.5;
const KEYWORD_NEGATIVE: f64 = 0.5;
const KEYWORD_MIN: f64 = 1.0;
const KEYWORD_MAX: f64 = 7.0;

const CONFIDENCE_OFFSET: i64 = 70;
const CONFIDENCE_MIN: i64 = 60;
const CONFIDENCE_MAX: i64 = 100;

/// Raw and normalized score for one archetype
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeScore {
    pub archetype_id: String,
    pub raw: f64,
    pub normalized: u32,
}

/// Output of one scoring run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    /// Top archetypes, descending by score, ties in definition order
    pub ranked: Vec<ArchetypeView>,
    pub confidence: u32,
    /// Every archetype, in definition order
    pub scores: Vec<ArchetypeScore>,
}

/// Scoring engine over a catalog
///
/// Pure: the same answers always produce the same report.
pub struct ScoringEngine<'a> {
    catalog: &'a Catalog,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Score a set of answers against every archetype
    pub fn score(&self, answers: &[Answer]) -> ScoreReport {
        // Later duplicates overwrite earlier ones
        let lookup: HashMap<&str, &AnswerValue> = answers
            .iter()
            .map(|a| (a.question_id.as_str(), &a.value))
            .collect();

        let archetypes = self.catalog.archetypes();
        let tables = self.catalog.scoring();
        let mut base_cache: HashMap<&str, Option<f64>> = HashMap::new();
        let mut raw = vec![0.0_f64; archetypes.len()];

        for (idx, archetype) in archetypes.iter().enumerate() {
            let Some(weights) = tables.weights.get(&archetype.id) else {
                continue;
            };
            for (question_id, weight) in weights {
                let Some(value) = lookup.get(question_id.as_str()) else {
                    continue;
                };
                let base = *base_cache.entry(question_id.as_str()).or_insert_with(|| {
                    self.catalog
                        .question(question_id)
                        .and_then(|q| self.base_score(q, value))
                });
                if let Some(base) = base {
                    raw[idx] += base * weight;
                }
            }
            tracing::trace!(archetype = %archetype.id, raw = raw[idx], "accumulated raw score");
        }

        let normalized = normalize(&raw);

        let mut order: Vec<usize> = (0..archetypes.len()).collect();
        // sort_by is stable, so equal scores keep definition order
        order.sort_by(|a, b| normalized[*b].cmp(&normalized[*a]));

        let ranked: Vec<ArchetypeView> = order
            .iter()
            .take(TOP_N)
            .map(|&idx| ArchetypeView::new(archetypes[idx].clone(), normalized[idx]))
            .collect();

        let top = ranked.first().map_or(0, |v| v.score);
        let second = ranked.get(1).map_or(top, |v| v.score);
        let confidence = confidence(top, second);

        let scores = archetypes
            .iter()
            .zip(raw.iter().zip(normalized.iter()))
            .map(|(a, (raw, normalized))| ArchetypeScore {
                archetype_id: a.id.clone(),
                raw: *raw,
                normalized: *normalized,
            })
            .collect();

        tracing::debug!(
            answers = answers.len(),
            top = ranked.first().map(|v| v.id()).unwrap_or("none"),
            confidence,
            "scoring complete"
        );

        ScoreReport {
            ranked,
            confidence,
            scores,
        }
    }

    /// Per-question base score, or `None` when the value does not fit the question
    pub fn base_score(&self, question: &Question, value: &AnswerValue) -> Option<f64> {
        match question.question_type {
            QuestionType::Choice => value
                .as_text()
                .filter(|option| !option.trim().is_empty())
                .map(|option| self.choice_score(&question.id, option)),
            QuestionType::Scale => value
                .as_number()
                .filter(|&n| scale_bounds(question).contains(&n))
                .map(|n| self.scale_score(&question.id, n)),
            QuestionType::Multiselect => value.as_list().map(|items| {
                if items.is_empty() {
                    MULTISELECT_EMPTY
                } else {
                    MULTISELECT_SELECTED
                }
            }),
            QuestionType::Text => value
                .as_text()
                .filter(|text| !text.trim().is_empty())
                .map(|text| self.text_score(&question.id, text)),
        }
    }

    fn choice_score(&self, question_id: &str, option: &str) -> f64 {
        self.catalog
            .scoring()
            .choice_scores
            .get(question_id)
            .and_then(|table| table.get(option))
            .copied()
            .unwrap_or(NEUTRAL_CHOICE_SCORE)
    }

    fn scale_score(&self, question_id: &str, value: f64) -> f64 {
        if self.catalog.scoring().direct_scale.contains(question_id) {
            value
        } else {
            rescale_to_five(value)
        }
    }

    fn text_score(&self, question_id: &str, text: &str) -> f64 {
        let tables = self.catalog.scoring();
        if !tables.revealing_text.contains(question_id) {
            return NEUTRAL_TEXT_SCORE;
        }

        let index = TextIndex::new(text);
        tables
            .keywords
            .values()
            .map(|tiers| keyword_score(&index, tiers))
            .max_by(f64::total_cmp)
            .unwrap_or(KEYWORD_BASE)
    }
}

/// Accepted answer range of a scale question, 1-7 unless the question says otherwise
fn scale_bounds(question: &Question) -> std::ops::RangeInclusive<f64> {
    let min = question.scale_min.unwrap_or(DEFAULT_SCALE_MIN);
    let max = question.scale_max.unwrap_or(DEFAULT_SCALE_MAX);
    (min as f64)..=(max as f64)
}

/// Linear map from the 1-7 input domain into 1-5
pub fn rescale_to_five(value: f64) -> f64 {
    ((value - 1.0) / 6.0) * 4.0 + 1.0
}

/// Min-max normalize raw scores to 0-100
///
/// All scores become [`DEGENERATE_SCORE`] when there is no spread.
pub fn normalize(raw: &[f64]) -> Vec<u32> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if raw.is_empty() || (max - min).abs() < 1e-9 {
        return vec![DEGENERATE_SCORE; raw.len()];
    }

    raw.iter()
        .map(|r| (((r - min) / (max - min)) * 100.0).round() as u32)
        .collect()
}

/// Separation heuristic between the top two normalized scores
pub fn confidence(top: u32, second: u32) -> u32 {
    (i64::from(top) - i64::from(second) + CONFIDENCE_OFFSET).clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
        as u32
}

/// Score free text against one archetype's keyword tiers, clamped to 1-7
pub fn keyword_score_text(text: &str, tiers: &KeywordTiers) -> f64 {
    keyword_score(&TextIndex::new(text), tiers)
}

fn keyword_score(index: &TextIndex, tiers: &KeywordTiers) -> f64 {
    let hits = |words: &[String]| words.iter().filter(|w| index.contains(w)).count() as f64;

    let score = KEYWORD_BASE
        + hits(tiers.high.as_slice()) * KEYWORD_HIGH
        + hits(tiers.medium.as_slice()) * KEYWORD_MEDIUM
        - hits(tiers.negative.as_slice()) * KEYWORD_NEGATIVE;
    score.clamp(KEYWORD_MIN, KEYWORD_MAX)
}

/// Lowercased text with punctuation collapsed to single spaces, for whole-word matching
struct TextIndex(String);

impl TextIndex {
    fn new(text: &str) -> Self {
        Self(format!(" {} ", normalize_words(text)))
    }

    fn contains(&self, keyword: &str) -> bool {
        let keyword = normalize_words(keyword);
        !keyword.is_empty() && self.0.contains(&format!(" {} ", keyword))
    }
}

fn normalize_words(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

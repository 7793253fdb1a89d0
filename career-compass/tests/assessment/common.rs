//! Common test utilities for assessment tests

#![allow(dead_code)]

use career_compass::storage::{MemoryStore, PersistenceLayer, StorageConfig};
use career_compass::{AssessmentSession, Catalog, RecordingReporter, ResultsAssembler};
use career_compass_sdk::{
    async_trait, Answer, AnswerValue, ArchetypeView, EnrichmentError, EnrichmentResult,
    EnrichmentService, QuestionType, Results,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const CONTENT_VERSION: &str = "1.0.0";

pub fn catalog() -> Arc<Catalog> {
    Catalog::shared().unwrap()
}

/// Three answers that clearly favour the analytical archetype
pub fn scenario_answers() -> Vec<Answer> {
    vec![
        Answer::new("stress_response", "Break it down into smaller, manageable steps"),
        Answer::new("personality_energy_source", 2),
        Answer::new("information_processing", 2),
    ]
}

/// A well-typed answer for every question in the bank
pub fn full_answers(catalog: &Catalog) -> Vec<Answer> {
    catalog
        .questions()
        .iter()
        .map(|q| {
            let value: AnswerValue = match q.question_type {
                QuestionType::Choice => q.options[0].clone().into(),
                QuestionType::Scale => 4.into(),
                QuestionType::Multiselect => vec![q.options[0].clone()].into(),
                QuestionType::Text => "I like to analyze data and solve hard problems".into(),
            };
            Answer::new(q.id.clone(), value)
        })
        .collect()
}

/// Answers for every required question except `skip`
pub fn required_answers_except(catalog: &Catalog, skip: &str) -> Vec<Answer> {
    full_answers(catalog)
        .into_iter()
        .filter(|a| {
            a.question_id != skip && catalog.question(&a.question_id).is_some_and(|q| q.required)
        })
        .collect()
}

pub fn layer_on(store: &MemoryStore, reporter: Arc<RecordingReporter>) -> PersistenceLayer {
    PersistenceLayer::new(
        Box::new(store.clone()),
        reporter,
        StorageConfig::default(),
        CONTENT_VERSION,
    )
}

pub fn memory_layer() -> (PersistenceLayer, MemoryStore, Arc<RecordingReporter>) {
    let store = MemoryStore::new();
    let reporter = Arc::new(RecordingReporter::new());
    (layer_on(&store, reporter.clone()), store, reporter)
}

pub fn session() -> (AssessmentSession, MemoryStore, Arc<RecordingReporter>) {
    let (layer, store, reporter) = memory_layer();
    let session = AssessmentSession::new(catalog(), layer, reporter.clone());
    (session, store, reporter)
}

pub fn session_on(store: &MemoryStore) -> AssessmentSession {
    let reporter = Arc::new(RecordingReporter::new());
    AssessmentSession::new(catalog(), layer_on(store, reporter.clone()), reporter)
}

pub fn basic_results() -> Results {
    let reporter = Arc::new(RecordingReporter::new());
    ResultsAssembler::new(catalog(), reporter).assemble_basic(&scenario_answers())
}

/// Enrichment service returning a fixed response
pub struct StaticService {
    response: Value,
    pub calls: AtomicUsize,
}

impl StaticService {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentService for StaticService {
    async fn enrich(
        &self,
        _answers: &[Answer],
        _ranked: &[ArchetypeView],
    ) -> Result<EnrichmentResult, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EnrichmentResult::from_value(self.response.clone())
    }
}

/// Enrichment service that always fails
pub struct FailingService(pub EnrichmentError);

#[async_trait]
impl EnrichmentService for FailingService {
    async fn enrich(
        &self,
        _answers: &[Answer],
        _ranked: &[ArchetypeView],
    ) -> Result<EnrichmentResult, EnrichmentError> {
        Err(self.0.clone())
    }
}

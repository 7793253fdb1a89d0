//! Assessment session
//!
//! Ties the state machine to scoring, results assembly and persistence. This is the
//! surface a UI drives: answer, navigate, complete, read results, reset.
//!
//! Completion is split in two so that basic results are scored and saved before
//! enrichment starts:
//!
//! 1. [`AssessmentSession::complete`] scores, saves the basic results and returns an
//!    [`EnrichmentRequest`] stamped with the current generation.
//! 2. [`AssessmentSession::settle_enrichment`] applies the outcome unless the session
//!    has moved on (reset, new completion) in the meantime.

pub mod state;

pub use state::{missing_required, transition, Phase, QuizCommand, QuizState, TransitionError};

use crate::assembler::{EnrichmentOutcome, ResultsAssembler};
use crate::catalog::Catalog;
use crate::storage::{PersistenceLayer, ProgressRecord, StorageError};
use career_compass_sdk::{Answer, AnswerValue, EnrichmentService, ErrorReporter, Question, Results};
use std::sync::Arc;

/// Work order for one enrichment attempt
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    pub generation: u64,
    pub answers: Vec<Answer>,
    pub base: Results,
}

pub struct AssessmentSession {
    catalog: Arc<Catalog>,
    state: QuizState,
    persistence: PersistenceLayer,
    assembler: ResultsAssembler,
}

impl AssessmentSession {
    pub fn new(
        catalog: Arc<Catalog>,
        persistence: PersistenceLayer,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let assembler = ResultsAssembler::new(catalog.clone(), reporter);
        Self {
            catalog,
            state: QuizState::new(),
            persistence,
            assembler,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn persistence(&self) -> &PersistenceLayer {
        &self.persistence
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state.phase {
            Phase::InProgress { index } => self.catalog.questions().get(index),
            _ => None,
        }
    }

    fn apply(&mut self, command: QuizCommand) -> Result<(), TransitionError> {
        self.state = transition(&self.state, command, self.catalog.questions())?;
        Ok(())
    }

    /// Save progress; a failure is already reported by the persistence layer
    fn persist_progress(&self) {
        let record = ProgressRecord {
            answers: self.state.answers.to_vec(),
            current_question_index: self.state.current_question_index(),
        };
        if let Err(err) = self.persistence.save_progress(&record) {
            tracing::warn!(code = err.code(), "progress not saved");
        }
    }

    // ========================================================================
    // Answers and navigation
    // ========================================================================

    pub fn answer(&mut self, question_id: impl Into<String>, value: impl Into<AnswerValue>) {
        let answer = Answer::new(question_id, value);
        if self.catalog.question(&answer.question_id).is_none() {
            tracing::warn!(question_id = %answer.question_id, "answer for unknown question");
        }
        // Answer is accepted in every phase
        let _ = self.apply(QuizCommand::Answer(answer));
        self.persist_progress();
    }

    pub fn next(&mut self) -> Result<(), TransitionError> {
        self.apply(QuizCommand::Next)?;
        self.persist_progress();
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), TransitionError> {
        self.apply(QuizCommand::Previous)?;
        self.persist_progress();
        Ok(())
    }

    pub fn go_to(&mut self, index: i64) -> Result<(), TransitionError> {
        self.apply(QuizCommand::GoTo(index))?;
        self.persist_progress();
        Ok(())
    }

    pub fn get_answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.state.answers.get(question_id)
    }

    pub fn answers(&self) -> &[Answer] {
        self.state.answers.as_slice()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required_questions().is_empty()
    }

    /// Prompt text of every required question still unanswered
    pub fn missing_required_questions(&self) -> Vec<String> {
        missing_required(&self.state.answers, self.catalog.questions())
    }

    // ========================================================================
    // Completion and enrichment
    // ========================================================================

    /// Score the answers, save the basic results and hand back an enrichment request
    ///
    /// Rejected with [`TransitionError::MissingRequired`] while required questions are
    /// unanswered.
    pub fn complete(&mut self) -> Result<EnrichmentRequest, TransitionError> {
        let missing = self.missing_required_questions();
        if !missing.is_empty() {
            tracing::info!(missing = missing.len(), "completion blocked");
            return Err(TransitionError::MissingRequired { missing });
        }

        let answers = self.state.answers.to_vec();
        let base = self.assembler.assemble_basic(&answers);
        self.apply(QuizCommand::Complete {
            results: base.clone(),
        })?;

        if let Err(err) = self.persistence.save_results(&base) {
            tracing::warn!(code = err.code(), "basic results not saved");
        }
        self.persist_progress();

        tracing::info!(
            generation = self.state.generation,
            top = base.top_archetype().map(|v| v.id()).unwrap_or("none"),
            confidence = base.confidence,
            "assessment completed"
        );

        Ok(EnrichmentRequest {
            generation: self.state.generation,
            answers,
            base,
        })
    }

    /// Run enrichment for a request without touching session state
    pub async fn enrich(
        &self,
        request: &EnrichmentRequest,
        service: &dyn EnrichmentService,
    ) -> EnrichmentOutcome {
        self.assembler
            .assemble_enriched(&request.answers, &request.base, service)
            .await
    }

    /// Apply an enrichment outcome; returns false when the request is stale
    ///
    /// Enriched results replace the saved record wholesale. After a failure the saved
    /// record stays the basic version.
    pub fn settle_enrichment(
        &mut self,
        request: &EnrichmentRequest,
        outcome: EnrichmentOutcome,
    ) -> bool {
        let succeeded = outcome.is_success();
        let before = self.state.generation;
        let awaiting = self.state.is_awaiting_enrichment();

        // Never fails: stale results are ignored by the state machine
        let _ = self.apply(QuizCommand::EnrichmentSettled {
            generation: request.generation,
            results: outcome.results.clone(),
            error: outcome.error,
        });

        let accepted = awaiting && request.generation == before;
        if accepted && succeeded {
            if let Err(err) = self.persistence.save_results(&outcome.results) {
                tracing::warn!(code = err.code(), "enriched results not saved");
            }
        }
        accepted
    }

    /// Complete, then enrich and settle in one call
    pub async fn complete_and_enrich(
        &mut self,
        service: &dyn EnrichmentService,
    ) -> Result<EnrichmentOutcome, TransitionError> {
        let request = self.complete()?;
        let outcome = self.enrich(&request, service).await;
        self.settle_enrichment(&request, outcome.clone());
        Ok(outcome)
    }

    // ========================================================================
    // Results access
    // ========================================================================

    pub fn get_results(&self) -> Option<&Results> {
        self.state.results.as_ref()
    }

    /// Message from the last failed enrichment, if any
    pub fn enrichment_error(&self) -> Option<&str> {
        self.state.enrichment_error.as_deref()
    }

    pub fn save_results_explicitly(&mut self, results: Results) -> Result<(), StorageError> {
        self.persistence.save_results(&results)?;
        let _ = self.apply(QuizCommand::SetResults(results));
        Ok(())
    }

    pub fn load_persisted_results(&mut self) -> Result<Option<Results>, StorageError> {
        let results = self.persistence.load_results()?;
        if let Some(results) = &results {
            let _ = self.apply(QuizCommand::SetResults(results.clone()));
        }
        Ok(results)
    }

    pub fn clear_results(&mut self) {
        self.persistence.clear_results();
        let _ = self.apply(QuizCommand::ClearResults);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Restore saved progress; returns false when there was none
    pub fn resume(&mut self) -> Result<bool, StorageError> {
        let Some(progress) = self.persistence.load_progress()? else {
            return Ok(false);
        };
        let _ = self.apply(QuizCommand::Restore {
            answers: progress.answers,
            index: progress.current_question_index,
        });
        tracing::info!(
            answers = self.state.answers.len(),
            index = self.state.current_question_index(),
            "progress restored"
        );
        Ok(true)
    }

    /// Return to the initial state and clear both stored records
    pub fn reset_all(&mut self) {
        let _ = self.apply(QuizCommand::Reset);
        self.persistence.clear_all();
        tracing::info!(generation = self.state.generation, "session reset");
    }
}

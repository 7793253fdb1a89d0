//! Quiz progress state machine
//!
//! ```text
//! NotStarted(-1) -> InProgress(i) -> Completed(awaiting_enrichment) -> Finalized
//! ```
//!
//! [`transition`] is a pure function from a state and a command to the next state.
//! Every completion and reset bumps `generation`; an enrichment result carrying an
//! older generation is stale and is dropped.

use crate::answers::AnswerStore;
use career_compass_sdk::{Answer, Question, Results};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    InProgress { index: usize },
    Completed { awaiting_enrichment: bool },
    Finalized,
}

/// Commands accepted by [`transition`]
#[derive(Debug, Clone, PartialEq)]
pub enum QuizCommand {
    Answer(Answer),
    Next,
    Previous,
    GoTo(i64),
    /// Basic results are ready; enrichment may follow
    Complete { results: Results },
    /// Enrichment for `generation` has finished, successfully or not
    EnrichmentSettled {
        generation: u64,
        results: Results,
        error: Option<String>,
    },
    /// Results supplied from outside the quiz flow (explicit save or restore)
    SetResults(Results),
    ClearResults,
    Reset,
    /// Reinstate saved progress
    Restore { answers: Vec<Answer>, index: i64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("{} required question(s) unanswered", .missing.len())]
    MissingRequired {
        /// Prompt text of every unanswered required question
        missing: Vec<String>,
    },

    #[error("the question bank is empty")]
    NoQuestions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizState {
    pub session_id: Uuid,
    pub generation: u64,
    pub phase: Phase,
    pub answers: AnswerStore,
    pub results: Option<Results>,
    pub enrichment_error: Option<String>,
    /// Last question index shown; -1 before the first
    pub last_index: i64,
}

impl QuizState {
    pub fn new() -> Self {
        Self::with_session_id(Uuid::new_v4())
    }

    pub fn with_session_id(session_id: Uuid) -> Self {
        Self {
            session_id,
            generation: 0,
            phase: Phase::NotStarted,
            answers: AnswerStore::new(),
            results: None,
            enrichment_error: None,
            last_index: -1,
        }
    }

    /// Index persisted with progress records
    pub fn current_question_index(&self) -> i64 {
        match self.phase {
            Phase::NotStarted => -1,
            Phase::InProgress { index } => index as i64,
            Phase::Completed { .. } | Phase::Finalized => self.last_index,
        }
    }

    pub fn is_awaiting_enrichment(&self) -> bool {
        matches!(
            self.phase,
            Phase::Completed {
                awaiting_enrichment: true
            }
        )
    }

    fn enter(&mut self, index: usize) {
        self.phase = Phase::InProgress { index };
        self.last_index = index as i64;
    }
}

impl Default for QuizState {
    fn default() -> Self {
        Self::new()
    }
}

/// Prompts of required questions without a usable answer, in question order
pub fn missing_required(answers: &AnswerStore, questions: &[Question]) -> Vec<String> {
    questions
        .iter()
        .filter(|q| q.required && !answers.is_answered(&q.id))
        .map(|q| q.prompt.clone())
        .collect()
}

fn clamp_index(index: i64, len: usize) -> usize {
    index.clamp(0, len as i64 - 1) as usize
}

/// Apply one command
pub fn transition(
    state: &QuizState,
    command: QuizCommand,
    questions: &[Question],
) -> Result<QuizState, TransitionError> {
    let mut next = state.clone();
    let len = questions.len();

    match command {
        QuizCommand::Answer(answer) => {
            next.answers.upsert(answer);
        }

        QuizCommand::Next => match state.phase {
            Phase::NotStarted => {
                if len == 0 {
                    return Err(TransitionError::NoQuestions);
                }
                next.enter(0);
            }
            Phase::InProgress { index } => next.enter((index + 1).min(len.saturating_sub(1))),
            Phase::Completed { .. } | Phase::Finalized => {}
        },

        QuizCommand::Previous => {
            if let Phase::InProgress { index } = state.phase {
                next.enter(index.saturating_sub(1));
            }
        }

        QuizCommand::GoTo(index) => {
            if len == 0 {
                return Err(TransitionError::NoQuestions);
            }
            next.enter(clamp_index(index, len));
        }

        QuizCommand::Complete { results } => {
            let missing = missing_required(&state.answers, questions);
            if !missing.is_empty() {
                return Err(TransitionError::MissingRequired { missing });
            }
            next.generation += 1;
            next.results = Some(results);
            next.enrichment_error = None;
            next.phase = Phase::Completed {
                awaiting_enrichment: true,
            };
        }

        QuizCommand::EnrichmentSettled {
            generation,
            results,
            error,
        } => {
            if generation != state.generation || !state.is_awaiting_enrichment() {
                tracing::debug!(
                    generation,
                    current = state.generation,
                    "discarding stale enrichment result"
                );
                return Ok(next);
            }
            next.results = Some(results);
            next.enrichment_error = error;
            next.phase = Phase::Finalized;
        }

        QuizCommand::SetResults(results) => {
            next.generation += 1;
            next.results = Some(results);
            next.enrichment_error = None;
            next.phase = Phase::Finalized;
        }

        QuizCommand::ClearResults => {
            next.generation += 1;
            next.results = None;
            next.enrichment_error = None;
        }

        QuizCommand::Reset => {
            next = QuizState::with_session_id(state.session_id);
            next.generation = state.generation + 1;
        }

        QuizCommand::Restore { answers, index } => {
            next.answers = AnswerStore::from_answers(answers);
            if index < 0 || len == 0 {
                next.phase = Phase::NotStarted;
                next.last_index = -1;
            } else {
                next.enter(clamp_index(index, len));
            }
        }
    }

    Ok(next)
}

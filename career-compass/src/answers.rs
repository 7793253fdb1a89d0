//! In-memory answer store
//!
//! Answers keep the order in which questions were first answered. Writing an answer
//! for a question that already has one replaces it in place.

use career_compass_sdk::{Answer, AnswerValue};
use serde::{Deserialize, Serialize};

/// Ordered question-id -> answer collection with upsert-by-key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: Vec<Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list, keeping the last answer for duplicate ids
    pub fn from_answers(answers: impl IntoIterator<Item = Answer>) -> Self {
        let mut store = Self::new();
        for answer in answers {
            store.upsert(answer);
        }
        store
    }

    /// Insert or replace an answer, returning the previous value
    pub fn upsert(&mut self, answer: Answer) -> Option<AnswerValue> {
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => Some(std::mem::replace(&mut existing.value, answer.value)),
            None => {
                self.answers.push(answer);
                None
            }
        }
    }

    pub fn set(
        &mut self,
        question_id: impl Into<String>,
        value: impl Into<AnswerValue>,
    ) -> Option<AnswerValue> {
        self.upsert(Answer::new(question_id, value))
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| &a.value)
    }

    /// True when the question has a non-blank answer
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id).is_some_and(|v| !v.is_blank())
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter()
    }

    pub fn as_slice(&self) -> &[Answer] {
        &self.answers
    }

    pub fn to_vec(&self) -> Vec<Answer> {
        self.answers.clone()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

impl FromIterator<Answer> for AnswerStore {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        Self::from_answers(iter)
    }
}

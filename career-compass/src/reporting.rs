//! Error reporter implementations
//!
//! Components never log failures on their own; they hand them to the injected
//! [`ErrorReporter`], whose lifecycle belongs to the application entry point.

use career_compass_sdk::{ErrorContext, ErrorReporter};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum number of reports kept by [`RecordingReporter`]
pub const HISTORY_LIMIT: usize = 50;

/// Forwards every report to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &dyn std::error::Error, context: &ErrorContext) {
        tracing::warn!(
            component = context.component,
            operation = %context.operation,
            key = context.key.as_deref().unwrap_or("-"),
            error = %error,
            "operation failed"
        );
    }
}

/// One captured report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedError {
    pub message: String,
    pub context: ErrorContext,
    pub at: DateTime<Utc>,
}

/// Keeps the most recent reports in memory and forwards them to `tracing`
#[derive(Debug, Default)]
pub struct RecordingReporter {
    history: Mutex<VecDeque<ReportedError>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn history(&self) -> std::sync::MutexGuard<'_, VecDeque<ReportedError>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reports, oldest first
    pub fn recent(&self) -> Vec<ReportedError> {
        self.history().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history().is_empty()
    }

    pub fn clear(&self) {
        self.history().clear();
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &dyn std::error::Error, context: &ErrorContext) {
        TracingReporter.report(error, context);

        let mut history = self.history();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(ReportedError {
            message: error.to_string(),
            context: context.clone(),
            at: Utc::now(),
        });
    }
}

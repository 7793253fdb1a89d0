//! Results assembly
//!
//! Basic results come from scoring and personality synthesis alone and are always
//! available. Enrichment is layered on afterwards; when it fails the basic results are
//! handed back untouched together with the error message.

use crate::catalog::Catalog;
use crate::personality;
use crate::scoring::ScoringEngine;
use career_compass_sdk::{
    Answer, EnrichmentResult, EnrichmentService, ErrorContext, ErrorReporter, Results,
};
use chrono::Utc;
use std::sync::Arc;

const COMPONENT: &str = "assembler";

/// Result of an enrichment attempt
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentOutcome {
    /// Enriched results on success, the unchanged base results on failure
    pub results: Results,
    pub error: Option<String>,
}

impl EnrichmentOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct ResultsAssembler {
    catalog: Arc<Catalog>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ResultsAssembler {
    pub fn new(catalog: Arc<Catalog>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { catalog, reporter }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Score and synthesize without enrichment
    pub fn assemble_basic(&self, answers: &[Answer]) -> Results {
        let report = ScoringEngine::new(&self.catalog).score(answers);
        Results {
            career_paths: report.ranked,
            personality_insight: personality::synthesize(answers),
            confidence: report.confidence,
            completed_at: Utc::now(),
            ai_analysis: None,
        }
    }

    /// Ask `service` to enrich `base` and merge the response
    ///
    /// Never fails: any enrichment error is reported and returned as a message next to
    /// the unchanged base results.
    pub async fn assemble_enriched(
        &self,
        answers: &[Answer],
        base: &Results,
        service: &dyn EnrichmentService,
    ) -> EnrichmentOutcome {
        // Re-check even when the service already validated its own response
        let response = service
            .enrich(answers, &base.career_paths)
            .await
            .and_then(|result| EnrichmentResult::from_value(result.into_value()));

        match response {
            Ok(enrichment) => {
                tracing::info!(
                    sections = ?enrichment.sections().collect::<Vec<_>>(),
                    "enrichment merged"
                );
                EnrichmentOutcome {
                    results: merge(base, enrichment),
                    error: None,
                }
            }
            Err(err) => {
                self.reporter
                    .report(&err, &ErrorContext::new(COMPONENT, "enrich"));
                EnrichmentOutcome {
                    results: base.clone(),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Build a new results record carrying the enrichment
///
/// Per-archetype reasoning is copied onto the matching career paths; everything else
/// stays in `ai_analysis` as delivered.
pub fn merge(base: &Results, enrichment: EnrichmentResult) -> Results {
    let career_paths = base
        .career_paths
        .iter()
        .cloned()
        .map(|mut path| {
            if let Some(reasoning) = enrichment.career_reasoning(path.id()) {
                path.ai_reasoning = Some(reasoning.to_string());
            }
            path
        })
        .collect();

    Results {
        career_paths,
        personality_insight: base.personality_insight.clone(),
        confidence: base.confidence,
        completed_at: base.completed_at,
        ai_analysis: Some(enrichment),
    }
}

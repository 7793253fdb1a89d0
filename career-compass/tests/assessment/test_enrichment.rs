//! Tests for results assembly and enrichment merging

use super::common::*;
use career_compass::assembler::merge;
use career_compass::{RecordingReporter, ResultsAssembler};
use career_compass_sdk::{EnrichmentError, EnrichmentResult};
use serde_json::json;
use std::sync::Arc;

fn assembler() -> (ResultsAssembler, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    (ResultsAssembler::new(catalog(), reporter.clone()), reporter)
}

#[test]
fn test_basic_results_shape() {
    let results = basic_results();
    assert_eq!(results.career_paths.len(), 3);
    assert_eq!(results.top_archetype().unwrap().id(), "analytical_problem_solver");
    assert_eq!(results.confidence, 97);
    assert!(results.ai_analysis.is_none());
    assert!(results.career_paths.iter().all(|p| p.ai_reasoning.is_none()));
}

#[test]
fn test_merge_copies_reasoning_and_keeps_base() {
    let base = basic_results();
    let enrichment = EnrichmentResult::from_value(json!({
        "careerReasoning": {
            "analytical_problem_solver": "Strong preference for structure.",
            "systematic_organizer": 42,
        },
        "developmentPlan": { "nextSteps": ["Take a statistics course"] },
        "vendorExtra": { "kept": true },
    }))
    .unwrap();

    let merged = merge(&base, enrichment.clone());

    assert_eq!(
        merged.career_paths[0].ai_reasoning.as_deref(),
        Some("Strong preference for structure.")
    );
    // Non-string reasoning is ignored
    assert_eq!(merged.career_paths[1].ai_reasoning, None);

    assert_eq!(merged.confidence, base.confidence);
    assert_eq!(merged.completed_at, base.completed_at);
    assert_eq!(merged.personality_insight, base.personality_insight);

    // Unknown sections pass through untouched
    let analysis = merged.ai_analysis.unwrap();
    assert_eq!(analysis.get("vendorExtra"), Some(&json!({ "kept": true })));
    assert_eq!(analysis, enrichment);

    // The base record is not modified
    assert!(base.ai_analysis.is_none());
}

#[tokio::test]
async fn test_enriched_outcome() {
    let (assembler, reporter) = assembler();
    let base = basic_results();
    let service = StaticService::new(json!({ "beliefPatterns": { "core": "fairness" } }));

    let outcome = assembler
        .assemble_enriched(&scenario_answers(), &base, &service)
        .await;

    assert!(outcome.is_success());
    assert!(outcome.results.is_enriched());
    assert_eq!(outcome.results.career_paths.len(), base.career_paths.len());
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn test_every_failure_returns_base() {
    let failures = [
        EnrichmentError::NotConfigured,
        EnrichmentError::Network("connection refused".into()),
        EnrichmentError::Timeout,
        EnrichmentError::Service {
            status: 500,
            message: "internal".into(),
        },
        EnrichmentError::MalformedResponse("expected a JSON object".into()),
        EnrichmentError::IncompleteResponse,
    ];

    let (assembler, reporter) = assembler();
    let base = basic_results();
    for failure in failures {
        let expected = failure.to_string();
        let outcome = assembler
            .assemble_enriched(&scenario_answers(), &base, &FailingService(failure))
            .await;
        assert_eq!(outcome.results, base);
        assert_eq!(outcome.error, Some(expected));
    }
    assert_eq!(reporter.len(), 6);
}

#[test]
fn test_response_structure_checks() {
    assert_eq!(
        EnrichmentResult::from_value(json!([1, 2])).unwrap_err(),
        EnrichmentError::MalformedResponse("expected a JSON object".into())
    );
    assert_eq!(
        EnrichmentResult::from_value(json!({})).unwrap_err(),
        EnrichmentError::IncompleteResponse
    );
    assert!(matches!(
        EnrichmentResult::from_value(json!({ "specificOccupations": "Pilot" })),
        Err(EnrichmentError::MalformedResponse(_))
    ));

    let partial = EnrichmentResult::from_value(json!({ "deepPersonality": {} })).unwrap();
    assert_eq!(partial.sections().collect::<Vec<_>>(), vec!["deepPersonality"]);
    assert!(partial.specific_occupations().is_none());
}

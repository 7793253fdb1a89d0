//! Tests for archetype scoring
//!
//! Determinism, normalization bounds, ranking, confidence and the reference scenario

use super::common::*;
use career_compass::scoring::{ScoreReport, ScoringEngine, DEGENERATE_SCORE, TOP_N};
use career_compass::Catalog;
use career_compass_sdk::Answer;

fn score(catalog: &Catalog, answers: &[Answer]) -> ScoreReport {
    ScoringEngine::new(catalog).score(answers)
}

fn raw(report: &ScoreReport, archetype_id: &str) -> f64 {
    report
        .scores
        .iter()
        .find(|s| s.archetype_id == archetype_id)
        .unwrap()
        .raw
}

fn normalized(report: &ScoreReport, archetype_id: &str) -> u32 {
    report
        .scores
        .iter()
        .find(|s| s.archetype_id == archetype_id)
        .unwrap()
        .normalized
}

/// A spread of answer sets used for property checks
fn answer_sets(catalog: &Catalog) -> Vec<Vec<Answer>> {
    let full = full_answers(catalog);
    let mut high_scales = full.clone();
    for answer in &mut high_scales {
        if answer.value.as_number().is_some() {
            answer.value = 7.into();
        }
    }
    let mut low_scales = full.clone();
    for answer in &mut low_scales {
        if answer.value.as_number().is_some() {
            answer.value = 1.into();
        }
    }
    vec![
        scenario_answers(),
        full,
        high_scales,
        low_scales,
        vec![Answer::new("risk_tolerance", 7)],
        vec![Answer::new("helping_others_importance", 6), Answer::new("work_pace", 1)],
    ]
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_scoring_is_deterministic() {
    let catalog = catalog();
    for answers in answer_sets(&catalog) {
        let first = score(&catalog, &answers);
        let second = score(&catalog, &answers);
        assert_eq!(first, second);
    }
}

#[test]
fn test_normalization_bounds() {
    let catalog = catalog();
    for answers in answer_sets(&catalog) {
        let report = score(&catalog, &answers);
        let values: Vec<u32> = report.scores.iter().map(|s| s.normalized).collect();
        assert!(values.iter().all(|v| *v <= 100));
        assert!(values.contains(&100), "{:?}", values);
        assert!(values.contains(&0), "{:?}", values);
    }
}

#[test]
fn test_degenerate_scores() {
    let catalog = catalog();
    let report = score(&catalog, &[]);
    assert!(report.scores.iter().all(|s| s.normalized == DEGENERATE_SCORE));
    assert_eq!(report.confidence, 70);

    // Ties keep definition order
    let ids: Vec<&str> = report.ranked.iter().map(|v| v.id()).collect();
    let expected: Vec<&str> = catalog.archetypes()[..3].iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_top_three_sorted() {
    let catalog = catalog();
    for answers in answer_sets(&catalog) {
        let report = score(&catalog, &answers);
        assert_eq!(report.ranked.len(), TOP_N);
        for pair in report.ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                let first = catalog.archetypes().iter().position(|a| a.id == pair[0].id());
                let second = catalog.archetypes().iter().position(|a| a.id == pair[1].id());
                assert!(first < second);
            }
        }
    }
}

#[test]
fn test_confidence_bounds() {
    let catalog = catalog();
    for answers in answer_sets(&catalog) {
        let report = score(&catalog, &answers);
        assert!((60..=100).contains(&report.confidence));
        let top = report.ranked[0].score;
        let second = report.ranked[1].score;
        let expected = (top as i64 - second as i64 + 70).clamp(60, 100) as u32;
        assert_eq!(report.confidence, expected);
    }
}

// ============================================================================
// Reference scenario
// ============================================================================

#[test]
fn test_analytical_scenario() {
    let catalog = catalog();
    let report = score(&catalog, &scenario_answers());

    let top: Vec<&str> = report.ranked.iter().map(|v| v.id()).collect();
    assert!(top.contains(&"analytical_problem_solver"));

    // hands_on_builder has no weight on any of the three questions
    assert_eq!(raw(&report, "hands_on_builder"), 0.0);
    assert!(
        normalized(&report, "analytical_problem_solver") > normalized(&report, "hands_on_builder")
    );
}

#[test]
fn test_analytical_scenario_exact_values() {
    let catalog = catalog();
    let report = score(&catalog, &scenario_answers());

    assert_eq!(raw(&report, "analytical_problem_solver"), 26.0);
    assert_eq!(raw(&report, "systematic_organizer"), 17.5);
    assert_eq!(raw(&report, "expressive_communicator"), -5.0);

    let top: Vec<(&str, u32)> = report.ranked.iter().map(|v| (v.id(), v.score)).collect();
    assert_eq!(
        top,
        vec![
            ("analytical_problem_solver", 100),
            ("systematic_organizer", 73),
            ("knowledge_seeker", 45),
        ]
    );
    assert_eq!(report.confidence, 97);
}

// ============================================================================
// Base scores by question type
// ============================================================================

#[test]
fn test_malformed_values_are_ignored() {
    let catalog = catalog();
    let baseline = score(&catalog, &scenario_answers());

    let mut answers = scenario_answers();
    answers.push(Answer::new("decision_style", "very logical"));
    answers.push(Answer::new("team_role", 4));
    answers.push(Answer::new("interest_areas", "Technology"));
    answers.push(Answer::new("ideal_work_day", vec!["data"]));
    answers.push(Answer::new("no_such_question", 5));

    assert_eq!(score(&catalog, &answers), baseline);
}

#[test]
fn test_unlisted_choice_option_is_neutral() {
    let catalog = catalog();
    let report = score(
        &catalog,
        &[Answer::new("stress_response", "Get hands-on and start fixing what I can")],
    );
    // 3.0 weight * neutral 3
    assert_eq!(raw(&report, "analytical_problem_solver"), 9.0);
}

#[test]
fn test_scale_direct_and_rescaled() {
    let catalog = catalog();

    // Direct mapping: 3.5 * 6
    let report = score(&catalog, &[Answer::new("information_processing", 6)]);
    assert_eq!(raw(&report, "analytical_problem_solver"), 21.0);

    // public_speaking_comfort is rescaled: 7 -> 5, weight 3.0
    let report = score(&catalog, &[Answer::new("public_speaking_comfort", 7)]);
    assert_eq!(raw(&report, "expressive_communicator"), 15.0);
}

#[test]
fn test_out_of_range_scale_values_are_ignored() {
    let catalog = catalog();
    let baseline = score(&catalog, &[Answer::new("work_pace", 4)]);

    for value in [1000.0, 0.0, -3.0, 7.5] {
        let report = score(
            &catalog,
            &[Answer::new("work_pace", 4), Answer::new("information_processing", value)],
        );
        assert_eq!(report, baseline, "{}", value);
    }

    // Both ends of the range still count
    let low = score(&catalog, &[Answer::new("information_processing", 1)]);
    let high = score(&catalog, &[Answer::new("information_processing", 7)]);
    assert_eq!(raw(&low, "analytical_problem_solver"), 3.5);
    assert_eq!(raw(&high, "analytical_problem_solver"), 24.5);
}

#[test]
fn test_multiselect_presence_only() {
    let catalog = catalog();
    let selected = score(&catalog, &[Answer::new("interest_areas", vec!["anything"])]);
    let empty = score(&catalog, &[Answer::new("interest_areas", Vec::<String>::new())]);

    assert_eq!(raw(&selected, "analytical_problem_solver"), 3.0);
    assert_eq!(raw(&empty, "analytical_problem_solver"), 1.0);
}

#[test]
fn test_revealing_text_takes_best_archetype() {
    let catalog = catalog();
    // Five high-signal analytical keywords: 3 + 5 = 8, clamped to 7
    let report = score(
        &catalog,
        &[Answer::new("ideal_work_day", "I analyze data and solve logic puzzles all day")],
    );
    assert_eq!(raw(&report, "analytical_problem_solver"), 14.0);
    // The same base score feeds every archetype weighting this prompt
    assert_eq!(raw(&report, "compassionate_helper"), 14.0);
}

#[test]
fn test_blank_text_is_ignored() {
    let catalog = catalog();
    let report = score(&catalog, &[Answer::new("ideal_work_day", "   ")]);
    assert!(report.scores.iter().all(|s| s.raw == 0.0));
}

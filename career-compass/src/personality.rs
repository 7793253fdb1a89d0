//! Qualitative personality insights
//!
//! A fixed set of scale answers (1-7) and two choice answers select pre-written
//! insight fragments. Scale rules branch on `<= 3` versus `>= 4`, with a few stronger
//! statements reserved for `>= 5`. A missing or non-numeric answer selects nothing.

use career_compass_sdk::{Answer, AnswerValue, PersonalityInsight};
use std::collections::HashMap;

const ENERGY_SOURCE: &str = "personality_energy_source";
const INFORMATION_PROCESSING: &str = "information_processing";
const WORK_ENVIRONMENT: &str = "work_environment_preference";
const RELATIONSHIP_DEPTH: &str = "relationship_depth";
const WORK_PACE: &str = "work_pace";
const RECOGNITION: &str = "recognition_motivation";
const LEGACY: &str = "legacy_desire";
const COMMITMENT: &str = "commitment_style";

/// Scale reading for one threshold rule
#[derive(Debug, Clone, Copy, PartialEq)]
enum Lean {
    Low,
    High { strong: bool },
}

fn lean(value: f64) -> Lean {
    if value <= 3.0 {
        Lean::Low
    } else {
        Lean::High {
            strong: value >= 5.0,
        }
    }
}

struct Lookup<'a>(HashMap<&'a str, &'a AnswerValue>);

impl<'a> Lookup<'a> {
    fn new(answers: &'a [Answer]) -> Self {
        Self(
            answers
                .iter()
                .map(|a| (a.question_id.as_str(), &a.value))
                .collect(),
        )
    }

    fn scale(&self, id: &str) -> Option<Lean> {
        self.0.get(id).and_then(|v| v.as_number()).map(lean)
    }

    fn choice(&self, id: &str) -> Option<&'a str> {
        self.0.get(id).and_then(|v| v.as_text())
    }
}

fn push(list: &mut Vec<String>, items: &[&str]) {
    list.extend(items.iter().map(|s| s.to_string()));
}

/// Derive personality insights from answers
pub fn synthesize(answers: &[Answer]) -> PersonalityInsight {
    let lookup = Lookup::new(answers);
    let mut insight = PersonalityInsight::default();

    // 1 = time with people, 7 = time alone
    match lookup.scale(ENERGY_SOURCE) {
        Some(Lean::Low) => {
            push(&mut insight.strengths, &["Building energy and momentum through collaboration"]);
            push(&mut insight.natural_tendencies, &["Recharges through time with other people"]);
            push(&mut insight.avoidance_areas, &["Long stretches of isolated, heads-down work"]);
        }
        Some(Lean::High { strong }) => {
            push(&mut insight.strengths, &["Sustained independent focus"]);
            push(&mut insight.natural_tendencies, &["Recharges through quiet, independent time"]);
            if strong {
                push(
                    &mut insight.avoidance_areas,
                    &["Constant interruptions and back-to-back meetings"],
                );
                push(
                    &mut insight.areas_for_growth,
                    &["Building visibility and a network beyond a close circle"],
                );
            }
        }
        None => {}
    }

    // 1 = big picture, 7 = concrete facts
    match lookup.scale(INFORMATION_PROCESSING) {
        Some(Lean::Low) => {
            push(&mut insight.strengths, &["Seeing connections and future possibilities"]);
            push(&mut insight.natural_tendencies, &["Thinks in patterns and big-picture concepts"]);
            push(&mut insight.areas_for_growth, &["Following through on practical details"]);
        }
        Some(Lean::High { strong }) => {
            push(&mut insight.strengths, &["Grounded, fact-based analysis"]);
            push(
                &mut insight.natural_tendencies,
                &["Prefers concrete information and proven methods"],
            );
            if strong {
                push(
                    &mut insight.areas_for_growth,
                    &["Staying open to untested ideas and ambiguity"],
                );
            }
        }
        None => {}
    }

    // 1 = calm and predictable, 7 = fast-moving
    match lookup.scale(WORK_ENVIRONMENT) {
        Some(Lean::Low) => {
            push(
                &mut insight.natural_tendencies,
                &["Does their best work in calm, predictable settings"],
            );
            push(
                &mut insight.avoidance_areas,
                &["Chaotic environments with constantly shifting priorities"],
            );
        }
        Some(Lean::High { strong }) => {
            push(
                &mut insight.natural_tendencies,
                &["Thrives on variety and a changing environment"],
            );
            if strong {
                push(&mut insight.strengths, &["Adapting quickly when plans change"]);
                push(&mut insight.avoidance_areas, &["Repetitive, highly routine roles"]);
            }
        }
        None => {}
    }

    // 1 = few deep connections, 7 = broad network
    match lookup.scale(RELATIONSHIP_DEPTH) {
        Some(Lean::Low) => {
            push(
                &mut insight.relationship_styles,
                &[
                    "Builds a small circle of deep, trusted relationships",
                    "Values loyalty and one-on-one conversation",
                ],
            );
        }
        Some(Lean::High { strong }) => {
            push(
                &mut insight.relationship_styles,
                &["Builds a wide network of contacts across groups"],
            );
            if strong {
                push(
                    &mut insight.relationship_styles,
                    &["Connects people and opportunities across their network"],
                );
                push(
                    &mut insight.areas_for_growth,
                    &["Investing depth in a few key relationships"],
                );
            }
        }
        None => {}
    }

    // 1 = steady, 7 = fast
    match lookup.scale(WORK_PACE) {
        Some(Lean::Low) => {
            push(&mut insight.strengths, &["Consistent, careful execution"]);
            push(&mut insight.natural_tendencies, &["Works at a steady, deliberate pace"]);
            push(
                &mut insight.avoidance_areas,
                &["Constant firefighting and last-minute deadlines"],
            );
        }
        Some(Lean::High { strong }) => {
            push(&mut insight.natural_tendencies, &["Enjoys momentum and a brisk pace"]);
            if strong {
                push(&mut insight.strengths, &["Delivering under pressure"]);
                push(&mut insight.areas_for_growth, &["Pausing to reflect before moving on"]);
            }
        }
        None => {}
    }

    // 1 = intrinsic, 7 = public recognition
    match lookup.scale(RECOGNITION) {
        Some(Lean::Low) => {
            push(&mut insight.motivators, &["Intrinsic satisfaction in work done well"]);
        }
        Some(Lean::High { strong }) => {
            push(&mut insight.motivators, &["Visible recognition and appreciation"]);
            if strong {
                push(
                    &mut insight.motivators,
                    &["Opportunities to be seen as an expert or leader"],
                );
                push(
                    &mut insight.areas_for_growth,
                    &["Finding satisfaction when work goes unnoticed"],
                );
            }
        }
        None => {}
    }

    if let Some(motivator) = lookup.choice(LEGACY).and_then(legacy_motivator) {
        push(&mut insight.motivators, &[motivator]);
    }

    match lookup.choice(COMMITMENT) {
        Some("I commit deeply once I've found the right path") => {
            push(&mut insight.natural_tendencies, &["Commits fully once the right path is clear"]);
            push(&mut insight.strengths, &["Long-term dedication"]);
        }
        Some("I commit after researching every option") => {
            push(&mut insight.natural_tendencies, &["Researches every option before committing"]);
            push(&mut insight.areas_for_growth, &["Acting before every question is answered"]);
        }
        Some("I commit quickly and adjust as I go") => {
            push(&mut insight.natural_tendencies, &["Commits quickly and adjusts along the way"]);
            push(&mut insight.strengths, &["Bias toward action"]);
        }
        Some("I prefer to keep my options open") => {
            push(&mut insight.natural_tendencies, &["Keeps options open"]);
            push(&mut insight.avoidance_areas, &["Rigid long-term commitments"]);
            push(
                &mut insight.areas_for_growth,
                &["Committing to a direction long enough to build depth"],
            );
        }
        _ => {}
    }

    insight.working_style = working_style(&lookup);
    insight
}

fn legacy_motivator(option: &str) -> Option<&'static str> {
    match option {
        "Creating something that outlasts me" => Some("Building work with lasting impact"),
        "Having helped many people live better lives" => Some("Improving the lives of others"),
        "Advancing human knowledge" => Some("Contributing to human understanding"),
        "Building an organization or business" => Some("Growing something of their own"),
        "Leading a movement for positive change" => Some("Driving meaningful social change"),
        "Providing security and opportunity for my family" => {
            Some("Security and opportunity for the people they love")
        }
        _ => None,
    }
}

/// One-line working style from energy, pace and information processing
///
/// Empty when none of those questions were answered.
fn working_style(lookup: &Lookup<'_>) -> String {
    let mut parts = Vec::new();

    match lookup.scale(ENERGY_SOURCE) {
        Some(Lean::Low) => parts.push("collaborative"),
        Some(Lean::High { .. }) => parts.push("independent"),
        None => {}
    }
    match lookup.scale(WORK_PACE) {
        Some(Lean::Low) => parts.push("steady"),
        Some(Lean::High { .. }) => parts.push("fast-paced"),
        None => {}
    }
    match lookup.scale(INFORMATION_PROCESSING) {
        Some(Lean::Low) => parts.push("big-picture"),
        Some(Lean::High { .. }) => parts.push("detail-focused"),
        None => {}
    }

    let Some(first) = parts.first() else {
        return String::new();
    };
    let article = if first.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    };

    let described = match parts.as_slice() {
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
        [] => String::new(),
    };

    format!("Prefers {} {} way of working", article, described)
}

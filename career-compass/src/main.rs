use anyhow::{bail, Context, Result};
use career_compass::storage::PersistenceLayer;
use career_compass::utils::open_store;
use career_compass::{
    AppConfig, AssessmentSession, Catalog, HttpEnrichmentClient, TracingReporter, TransitionError,
};
use career_compass_sdk::{Answer, AnswerValue, ErrorReporter};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "career-compass", about = "Career archetype assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the question bank
    Questions,

    /// Score a set of answers and save the results
    Score {
        /// JSON file with a list of {questionId, value} objects or a questionId -> value map
        #[arg(short, long)]
        answers: PathBuf,

        /// Enrich results through the configured endpoint
        #[arg(long)]
        enrich: bool,
    },

    /// Print the saved results
    Show,

    /// Check storage availability and record validity
    Health,

    /// Remove invalid stored records
    Repair,

    /// Clear all saved progress and results
    Reset,
}

/// Accepted answer file layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerFile {
    List(Vec<Answer>),
    Map(BTreeMap<String, AnswerValue>),
}

fn read_answers(path: &Path) -> Result<Vec<Answer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers from {}", path.display()))?;
    let file: AnswerFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse answers in {}", path.display()))?;
    Ok(match file {
        AnswerFile::List(answers) => answers,
        AnswerFile::Map(map) => map.into_iter().map(|(id, v)| Answer::new(id, v)).collect(),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("career_compass=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let catalog = Catalog::shared().context("Failed to load the built-in question catalog")?;

    if let Command::Questions = cli.command {
        for (idx, question) in catalog.questions().iter().enumerate() {
            let marker = if question.required { "*" } else { " " };
            println!(
                "{:>3}{} [{:?}] {}: {}",
                idx + 1,
                marker,
                question.question_type,
                question.id,
                question.prompt
            );
        }
        return Ok(());
    }

    let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingReporter);
    let persistence = PersistenceLayer::new(
        open_store(&config)?,
        reporter.clone(),
        config.storage_config(),
        catalog.version(),
    );

    match cli.command {
        Command::Questions => {}

        Command::Score { answers, enrich } => {
            let answers = read_answers(&answers)?;
            let mut session = AssessmentSession::new(catalog.clone(), persistence, reporter);
            for answer in answers {
                session.answer(answer.question_id, answer.value);
            }

            let outcome = if enrich {
                let client = HttpEnrichmentClient::from_config(&config.enrichment, catalog.clone())
                    .context("Enrichment requested but CAREER_COMPASS_ENRICHMENT_URL is not set")?;
                session.complete_and_enrich(&client).await
            } else {
                session.complete().map(|request| career_compass::EnrichmentOutcome {
                    results: request.base,
                    error: None,
                })
            };

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(TransitionError::MissingRequired { missing }) => {
                    eprintln!("{} required question(s) unanswered:", missing.len());
                    for prompt in &missing {
                        eprintln!("  - {}", prompt);
                    }
                    bail!("assessment incomplete");
                }
                Err(err) => return Err(err.into()),
            };

            if let Some(error) = &outcome.error {
                eprintln!("Enrichment failed, showing basic results: {}", error);
            }
            print_json(&outcome.results)?;
        }

        Command::Show => match persistence.load_results() {
            Ok(Some(results)) => print_json(&results)?,
            Ok(None) => println!("No saved results."),
            Err(err) => bail!("{} ({})", err.user_message(), err.code()),
        },

        Command::Health => {
            for report in persistence.health_all() {
                println!(
                    "{}: available={} has_data={} data_valid={}",
                    report.key, report.available, report.has_data, report.data_valid
                );
                for error in &report.errors {
                    println!("  - {}", error);
                }
            }
        }

        Command::Repair => {
            for report in persistence.repair_all() {
                for action in &report.actions {
                    println!("{}", action);
                }
                for error in &report.errors {
                    eprintln!("error: {}", error);
                }
                if !report.success {
                    bail!("repair did not complete");
                }
            }
        }

        Command::Reset => {
            persistence.clear_all();
            println!("Cleared saved progress and results.");
        }
    }

    Ok(())
}

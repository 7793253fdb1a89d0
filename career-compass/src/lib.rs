// Static question bank, archetypes and scoring tables
pub mod catalog;

// Answer collection with upsert-by-question
pub mod answers;

// Weighted archetype scoring
pub mod scoring;

// Threshold-based personality insights
pub mod personality;

// Basic and enriched results
pub mod assembler;

// HTTP enrichment service client
pub mod enrichment;

// Versioned persistence and storage backends
pub mod storage;

// Progress state machine and session facade
pub mod session;

// Error reporter implementations
pub mod reporting;

// Environment configuration
pub mod config;

pub mod utils;

pub use answers::AnswerStore;
pub use assembler::{EnrichmentOutcome, ResultsAssembler};
pub use catalog::{Catalog, CatalogError};
pub use config::AppConfig;
pub use enrichment::HttpEnrichmentClient;
pub use reporting::{RecordingReporter, TracingReporter};
pub use scoring::{ScoreReport, ScoringEngine};
pub use session::{AssessmentSession, EnrichmentRequest, Phase, TransitionError};
pub use storage::{PersistenceLayer, StorageConfig, StorageError, StorageErrorKind};

//! Versioned, validated persistence over a key-value backend
//!
//! Two independent record kinds are stored under separate keys: in-progress answers
//! ([`ProgressRecord`]) and finalized results ([`ResultsRecord`]). Both share the
//! envelope, load, health and repair machinery; only the payload validators differ.
//!
//! # Behaviour
//!
//! - **save** validates the envelope before writing. On a quota failure it deletes
//!   expired or unreadable records under every known key and retries exactly once.
//! - **load** deletes a record that fails to parse or validate, so a corrupt record
//!   heals itself on the next read.
//! - **repair** is strictly destructive: it removes invalid records and never
//!   restores or fabricates data.

pub mod backends;
pub mod database;
pub mod envelope;
pub mod error;
pub mod validation;

pub use backends::{FileStore, MemoryStore};
pub use database::SqliteStore;
pub use envelope::{ProgressRecord, RecordKind, ResultsRecord, StoredRecord, STORAGE_FORMAT_VERSION};
pub use error::{StorageError, StorageErrorKind};
pub use validation::ValidationContext;

use career_compass_sdk::{BackendError, ErrorContext, ErrorReporter, KeyValueStore, Results};
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;

pub const PROGRESS_KEY: &str = "career-compass.progress";
pub const RESULTS_KEY: &str = "career-compass.results";
/// Keys written by earlier storage formats
pub const LEGACY_KEYS: [&str; 2] = ["career-compass.results.v0", "career-compass.answers"];

const PROBE_KEY: &str = "__career_compass_probe__";
const COMPONENT: &str = "persistence";

/// Keys and retention policy
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub progress_key: String,
    pub results_key: String,
    pub legacy_keys: Vec<String>,
    /// Records older than this are removed when space runs out
    pub retention: Duration,
    /// Tolerance for timestamps slightly in the future
    pub clock_skew: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            progress_key: PROGRESS_KEY.to_string(),
            results_key: RESULTS_KEY.to_string(),
            legacy_keys: LEGACY_KEYS.iter().map(|k| k.to_string()).collect(),
            retention: Duration::days(30),
            clock_skew: Duration::seconds(validation::DEFAULT_CLOCK_SKEW_SECS),
        }
    }
}

impl StorageConfig {
    /// Every key this layer may have written
    pub fn known_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.progress_key.as_str(), self.results_key.as_str()];
        keys.extend(self.legacy_keys.iter().map(String::as_str));
        keys
    }
}

/// Outcome of a health check on one key
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub key: String,
    pub available: bool,
    pub has_data: bool,
    /// True when no data is present
    pub data_valid: bool,
    pub errors: Vec<String>,
}

/// Outcome of a repair pass
#[derive(Debug, Clone, PartialEq)]
pub struct RepairReport {
    pub success: bool,
    pub actions: Vec<String>,
    pub errors: Vec<String>,
}

/// Persistence layer for progress and results records
pub struct PersistenceLayer {
    backend: Box<dyn KeyValueStore>,
    reporter: Arc<dyn ErrorReporter>,
    config: StorageConfig,
    content_version: String,
}

impl PersistenceLayer {
    pub fn new(
        backend: Box<dyn KeyValueStore>,
        reporter: Arc<dyn ErrorReporter>,
        config: StorageConfig,
        content_version: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            reporter,
            config,
            content_version: content_version.into(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn content_version(&self) -> &str {
        &self.content_version
    }

    fn context(&self) -> ValidationContext {
        ValidationContext::new(self.config.clock_skew)
    }

    fn report(&self, err: &dyn std::error::Error, operation: &str, key: &str) {
        self.reporter
            .report(err, &ErrorContext::new(COMPONENT, operation).with_key(key));
    }

    // ========================================================================
    // Generic operations
    // ========================================================================

    /// Wrap `payload` in a fresh envelope and write it under `key`
    pub fn save<K: RecordKind>(&self, key: &str, payload: &K) -> Result<(), StorageError> {
        let record = StoredRecord::new(payload.clone(), self.content_version.clone());
        let result = self.save_record(key, &record);
        if let Err(err) = &result {
            if !err.is_recoverable() {
                tracing::error!(key, code = err.code(), "storage cannot be written");
            }
            self.report(err, "save", key);
        }
        result
    }

    fn save_record<K: RecordKind>(
        &self,
        key: &str,
        record: &StoredRecord<K>,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(record)
            .map_err(|e| StorageError::validation(format!("{} record: {}", K::LABEL, e)))?;

        let issues = validation::validate_envelope::<K>(&value, &self.context());
        if !issues.is_empty() {
            return Err(StorageError::validation(format!(
                "refusing to write invalid {} record: {}",
                K::LABEL,
                issues.join("; ")
            )));
        }

        let text = value.to_string();
        match self.backend.set(key, &text) {
            Ok(()) => {
                tracing::debug!(key, kind = K::LABEL, bytes = text.len(), "record saved");
                Ok(())
            }
            Err(BackendError::QuotaExceeded) => {
                let freed = self.free_space();
                tracing::warn!(key, freed = ?freed, "storage quota exceeded, retrying once");
                self.backend.set(key, &text).map_err(StorageError::from)?;
                tracing::info!(key, kind = K::LABEL, "record saved after cleanup");
                Ok(())
            }
            Err(err) => Err(StorageError::from(err)),
        }
    }

    /// Remove expired or unreadable records under every known key
    fn free_space(&self) -> Vec<String> {
        // A retention reaching past the earliest representable date expires nothing
        let cutoff = chrono::Utc::now().checked_sub_signed(self.config.retention);
        let mut freed = Vec::new();

        for key in self.config.known_keys() {
            let raw = match self.backend.get(key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    self.report(&err, "free_space", key);
                    continue;
                }
            };

            let expired = match serde_json::from_str::<Value>(&raw) {
                Ok(value) => value
                    .get("timestamp")
                    .and_then(validation::parse_timestamp)
                    .map_or(true, |ts| cutoff.is_some_and(|cutoff| ts < cutoff)),
                Err(_) => true,
            };

            if expired {
                match self.backend.remove(key) {
                    Ok(()) => freed.push(key.to_string()),
                    Err(err) => self.report(&err, "free_space", key),
                }
            }
        }

        freed
    }

    /// Read, validate and decode the record under `key`
    ///
    /// Returns `Ok(None)` when nothing is stored. Invalid records are deleted before
    /// the error is returned.
    pub fn load<K: RecordKind>(&self, key: &str) -> Result<Option<StoredRecord<K>>, StorageError> {
        let result = self.load_record(key);
        if let Err(err) = &result {
            self.report(err, "load", key);
        }
        result
    }

    fn load_record<K: RecordKind>(
        &self,
        key: &str,
    ) -> Result<Option<StoredRecord<K>>, StorageError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };

        let record = match self.check_record::<K>(&raw) {
            Ok(record) => record,
            Err(err) => {
                self.discard(key);
                return Err(err);
            }
        };

        if record.content_version != self.content_version {
            tracing::warn!(
                key,
                stored = %record.content_version,
                current = %self.content_version,
                "record was saved against a different question bank version"
            );
        }

        Ok(Some(record))
    }

    /// Parse, validate and decode raw record text
    ///
    /// Every read path goes through here, so load, health and repair agree on what
    /// counts as a valid record.
    fn check_record<K: RecordKind>(&self, raw: &str) -> Result<StoredRecord<K>, StorageError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            StorageError::corrupted(format!("{} record is not valid JSON: {}", K::LABEL, e))
        })?;

        let ctx = self.context();
        let issues = validation::validate_envelope::<K>(&value, &ctx);
        if !issues.is_empty() {
            return Err(StorageError::validation(format!(
                "{} record failed validation: {}",
                K::LABEL,
                issues.join("; ")
            )));
        }

        let record: StoredRecord<K> = serde_json::from_value(value).map_err(|e| {
            StorageError::corrupted(format!("{} record could not be decoded: {}", K::LABEL, e))
        })?;

        // Re-check the decoded form against the same rules
        let reencoded = serde_json::to_value(&record)
            .map_err(|e| StorageError::corrupted(format!("{} record: {}", K::LABEL, e)))?;
        let issues = validation::validate_envelope::<K>(&reencoded, &ctx);
        if !issues.is_empty() {
            return Err(StorageError::validation(format!(
                "decoded {} record failed validation: {}",
                K::LABEL,
                issues.join("; ")
            )));
        }

        let current_major = validation::major_version(STORAGE_FORMAT_VERSION);
        if validation::major_version(&record.storage_format_version) != current_major {
            return Err(StorageError::validation(format!(
                "unsupported storage format {} (current {})",
                record.storage_format_version, STORAGE_FORMAT_VERSION
            )));
        }

        Ok(record)
    }

    fn discard(&self, key: &str) {
        match self.backend.remove(key) {
            Ok(()) => tracing::warn!(key, "removed invalid record"),
            Err(err) => self.report(&err, "discard", key),
        }
    }

    /// Remove the record under `key`; failures are reported, not returned
    pub fn clear(&self, key: &str) {
        match self.backend.remove(key) {
            Ok(()) => tracing::debug!(key, "record cleared"),
            Err(err) => self.report(&StorageError::from(err), "clear", key),
        }
    }

    /// Check availability and the validity of whatever is stored under `key`
    pub fn health<K: RecordKind>(&self, key: &str) -> HealthReport {
        let mut report = HealthReport {
            key: key.to_string(),
            available: false,
            has_data: false,
            data_valid: true,
            errors: Vec::new(),
        };

        let probe = self
            .backend
            .set(PROBE_KEY, "probe")
            .and_then(|_| self.backend.remove(PROBE_KEY));
        match probe {
            Ok(()) => report.available = true,
            Err(err) => report.errors.push(StorageError::from(err).to_string()),
        }

        let raw = match self.backend.get(key) {
            Ok(raw) => raw,
            Err(err) => {
                report.errors.push(StorageError::from(err).to_string());
                report.data_valid = false;
                return report;
            }
        };

        let Some(raw) = raw else {
            return report;
        };
        report.has_data = true;

        if let Err(err) = self.check_record::<K>(&raw) {
            report.data_valid = false;
            report.errors.push(err.to_string());
        }
        report
    }

    /// Delete invalid data under `key` and unparseable data under every other known key
    pub fn repair<K: RecordKind>(&self, key: &str) -> RepairReport {
        let mut actions = Vec::new();
        let mut errors = Vec::new();

        let health = self.health::<K>(key);
        if !health.available {
            errors.extend(health.errors.iter().cloned());
        }

        if health.has_data && !health.data_valid {
            match self.backend.remove(key) {
                Ok(()) => actions.push(format!("cleared invalid record '{}'", key)),
                Err(err) => errors.push(StorageError::from(err).to_string()),
            }
        }

        for other in self.config.known_keys() {
            if other == key {
                continue;
            }
            let raw = match self.backend.get(other) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    errors.push(StorageError::from(err).to_string());
                    continue;
                }
            };
            if serde_json::from_str::<Value>(&raw).is_err() {
                match self.backend.remove(other) {
                    Ok(()) => actions.push(format!("cleared unreadable record '{}'", other)),
                    Err(err) => errors.push(StorageError::from(err).to_string()),
                }
            }
        }

        tracing::info!(key, actions = actions.len(), errors = errors.len(), "repair finished");

        RepairReport {
            success: errors.is_empty(),
            actions,
            errors,
        }
    }

    // ========================================================================
    // Typed helpers
    // ========================================================================

    pub fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError> {
        self.save(&self.config.progress_key, progress)
    }

    pub fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(self
            .load::<ProgressRecord>(&self.config.progress_key)?
            .map(|r| r.payload))
    }

    pub fn clear_progress(&self) {
        self.clear(&self.config.progress_key);
    }

    pub fn save_results(&self, results: &Results) -> Result<(), StorageError> {
        self.save(
            &self.config.results_key,
            &ResultsRecord {
                results: results.clone(),
            },
        )
    }

    pub fn load_results(&self) -> Result<Option<Results>, StorageError> {
        Ok(self
            .load::<ResultsRecord>(&self.config.results_key)?
            .map(|r| r.payload.results))
    }

    pub fn clear_results(&self) {
        self.clear(&self.config.results_key);
    }

    /// Clear both record kinds
    pub fn clear_all(&self) {
        self.clear_progress();
        self.clear_results();
    }

    pub fn health_all(&self) -> Vec<HealthReport> {
        vec![
            self.health::<ProgressRecord>(&self.config.progress_key),
            self.health::<ResultsRecord>(&self.config.results_key),
        ]
    }

    pub fn repair_all(&self) -> Vec<RepairReport> {
        vec![
            self.repair::<ProgressRecord>(&self.config.progress_key),
            self.repair::<ResultsRecord>(&self.config.results_key),
        ]
    }
}

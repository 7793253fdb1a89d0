//! Tests for versioned persistence over the storage backends

use super::common::*;
use career_compass::storage::{
    FileStore, MemoryStore, PersistenceLayer, ProgressRecord, ResultsRecord, SqliteStore,
    StorageConfig, StorageErrorKind, LEGACY_KEYS, PROGRESS_KEY, RESULTS_KEY,
};
use career_compass::RecordingReporter;
use career_compass_sdk::{Answer, BackendError, EnrichmentResult, KeyValueStore};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

fn progress() -> ProgressRecord {
    ProgressRecord {
        answers: scenario_answers(),
        current_question_index: 3,
    }
}

/// A well-formed progress envelope with a large payload and the given age
fn padded_progress(age: Duration) -> String {
    json!({
        "answers": [{ "questionId": "dream_job", "value": "x".repeat(50_000) }],
        "currentQuestionIndex": 3,
        "timestamp": (Utc::now() - age).to_rfc3339(),
        "storageFormatVersion": "1.0.0",
        "contentVersion": CONTENT_VERSION,
    })
    .to_string()
}

/// Raw envelope of a freshly saved results record
fn stored_results() -> serde_json::Value {
    let (layer, store, _) = memory_layer();
    layer.save_results(&basic_results()).unwrap();
    serde_json::from_str(&store.raw(RESULTS_KEY).unwrap()).unwrap()
}

fn layer_over(backend: Box<dyn KeyValueStore>) -> (PersistenceLayer, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    let layer = PersistenceLayer::new(
        backend,
        reporter.clone(),
        StorageConfig::default(),
        CONTENT_VERSION,
    );
    (layer, reporter)
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_results_roundtrip() {
    let (layer, store, reporter) = memory_layer();
    let results = basic_results();

    layer.save_results(&results).unwrap();
    assert_eq!(layer.load_results().unwrap(), Some(results));
    assert!(store.raw(RESULTS_KEY).unwrap().contains("\"storageFormatVersion\":\"1.0.0\""));
    assert!(reporter.is_empty());
}

#[test]
fn test_enriched_results_roundtrip() {
    let (layer, _, _) = memory_layer();
    let mut results = basic_results();
    results.ai_analysis = Some(
        EnrichmentResult::from_value(json!({
            "specificOccupations": [{ "title": "Data Scientist" }],
            "deepPersonality": { "summary": "Curious" },
        }))
        .unwrap(),
    );

    layer.save_results(&results).unwrap();
    let loaded = layer.load_results().unwrap().unwrap();
    assert!(loaded.is_enriched());
    assert_eq!(loaded, results);
}

#[test]
fn test_record_kinds_are_independent() {
    let (layer, store, _) = memory_layer();
    layer.save_progress(&progress()).unwrap();
    layer.save_results(&basic_results()).unwrap();

    layer.clear_progress();
    assert!(store.raw(PROGRESS_KEY).is_none());
    assert!(layer.load_results().unwrap().is_some());
}

// ============================================================================
// Self-healing loads
// ============================================================================

#[test]
fn test_corrupted_record_heals_itself() {
    let (layer, store, reporter) = memory_layer();
    store.insert_raw(RESULTS_KEY, "{\"careerPaths\": [");

    let err = layer.load_results().unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::CorruptedData);
    assert!(store.raw(RESULTS_KEY).is_none());
    assert_eq!(reporter.len(), 1);
    assert_eq!(reporter.recent()[0].context.key.as_deref(), Some(RESULTS_KEY));

    // The second read sees nothing instead of the same failure
    assert_eq!(layer.load_results().unwrap(), None);
}

#[test]
fn test_invalid_record_is_discarded() {
    let (layer, store, _) = memory_layer();
    let mut raw = stored_results();
    raw["results"]["careerPaths"] = json!([]);
    store.insert_raw(RESULTS_KEY, &raw.to_string());

    let err = layer.load_results().unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::ValidationFailed);
    assert!(err.detail.contains("careerPaths is empty"));
    assert!(store.raw(RESULTS_KEY).is_none());
}

#[test]
fn test_progress_with_bad_answers_is_discarded() {
    let (layer, store, _) = memory_layer();
    store.insert_raw(
        PROGRESS_KEY,
        &json!({
            "answers": [{ "questionId": "work_pace", "value": { "nested": true } }],
            "currentQuestionIndex": 0,
            "timestamp": Utc::now().to_rfc3339(),
            "storageFormatVersion": "1.0.0",
            "contentVersion": CONTENT_VERSION,
        })
        .to_string(),
    );

    let err = layer.load_progress().unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::ValidationFailed);
    assert!(store.raw(PROGRESS_KEY).is_none());
}

#[test]
fn test_future_completion_time_is_refused() {
    let (layer, store, _) = memory_layer();
    let mut results = basic_results();
    results.completed_at = Utc::now() + Duration::hours(1);

    let err = layer.save_results(&results).unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::ValidationFailed);
    assert!(store.raw(RESULTS_KEY).is_none());

    // A small skew is tolerated
    results.completed_at = Utc::now() + Duration::seconds(60);
    layer.save_results(&results).unwrap();
}

#[test]
fn test_future_completion_time_on_disk_is_discarded() {
    let (layer, store, _) = memory_layer();
    let mut raw = stored_results();
    raw["results"]["completedAt"] = json!((Utc::now() + Duration::days(2)).to_rfc3339());
    store.insert_raw(RESULTS_KEY, &raw.to_string());

    let err = layer.load_results().unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::ValidationFailed);
    assert!(store.raw(RESULTS_KEY).is_none());
}

// ============================================================================
// Quota handling
// ============================================================================

#[test]
fn test_quota_retry_replaces_previous_record() {
    let (layer, store, reporter) = memory_layer();
    layer.save_progress(&progress()).unwrap();

    let updated = ProgressRecord {
        answers: vec![Answer::new("work_pace", 1)],
        current_question_index: 7,
    };
    store.fail_next_write(BackendError::QuotaExceeded);

    layer.save_progress(&updated).unwrap();
    assert_eq!(layer.load_progress().unwrap(), Some(updated));
    assert!(reporter.is_empty());
}

#[test]
fn test_quota_retry_after_removing_stale_records() {
    let store = MemoryStore::new();
    store.insert_raw(PROGRESS_KEY, &padded_progress(Duration::days(60)));
    store.set_quota(Some(store.used_bytes() + 100));

    let reporter = Arc::new(RecordingReporter::new());
    let layer = layer_on(&store, reporter.clone());

    layer.save_results(&basic_results()).unwrap();
    assert!(store.raw(PROGRESS_KEY).is_none());
    assert!(store.raw(RESULTS_KEY).is_some());
    assert!(reporter.is_empty());
}

#[test]
fn test_quota_cleanup_keeps_fresh_records() {
    let store = MemoryStore::new();
    let fresh = padded_progress(Duration::minutes(5));
    store.insert_raw(PROGRESS_KEY, &fresh);
    store.set_quota(Some(store.used_bytes() + 100));

    let reporter = Arc::new(RecordingReporter::new());
    let layer = layer_on(&store, reporter.clone());

    let err = layer.save_results(&basic_results()).unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::QuotaExceeded);
    assert!(err.is_recoverable());
    assert_eq!(store.raw(PROGRESS_KEY), Some(fresh));
    assert!(store.raw(RESULTS_KEY).is_none());
    assert_eq!(reporter.len(), 1);
}

#[test]
fn test_quota_cleanup_removes_unreadable_legacy_data() {
    let (layer, store, _) = memory_layer();
    store.insert_raw(LEGACY_KEYS[1], "answers=1,2,3");
    store.fail_next_write(BackendError::QuotaExceeded);

    layer.save_progress(&progress()).unwrap();
    assert!(store.raw(LEGACY_KEYS[1]).is_none());
    assert_eq!(layer.load_progress().unwrap(), Some(progress()));
}

#[test]
fn test_quota_retry_happens_once() {
    let (layer, store, _) = memory_layer();
    store.fail_next_write(BackendError::QuotaExceeded);
    store.fail_next_write(BackendError::QuotaExceeded);

    let err = layer.save_progress(&progress()).unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::QuotaExceeded);
    assert!(store.raw(PROGRESS_KEY).is_none());
}

// ============================================================================
// Error classification
// ============================================================================

#[test]
fn test_backend_errors_are_classified() {
    let cases = [
        (BackendError::Unavailable("gone".into()), StorageErrorKind::Unavailable),
        (BackendError::PermissionDenied("ro".into()), StorageErrorKind::PermissionDenied),
        (BackendError::Network("reset".into()), StorageErrorKind::NetworkError),
        (BackendError::Other("odd".into()), StorageErrorKind::UnknownError),
    ];

    for (backend_error, kind) in cases {
        let (layer, store, reporter) = memory_layer();
        store.fail_next_write(backend_error);
        let err = layer.save_progress(&progress()).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(reporter.recent()[0].context.operation, "save");
    }
}

#[test]
fn test_unavailable_store() {
    let (layer, store, reporter) = memory_layer();
    store.set_available(false);

    let err = layer.save_progress(&progress()).unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::Unavailable);
    assert!(!err.is_recoverable());

    let err = layer.load_results().unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::Unavailable);

    // Clearing reports instead of failing
    layer.clear_all();
    assert_eq!(reporter.len(), 4);
}

#[test]
fn test_every_kind_has_a_code_and_message() {
    for kind in StorageErrorKind::ALL {
        assert!(!kind.code().is_empty());
        assert!(!kind.user_message().is_empty());
    }
}

// ============================================================================
// Health and repair
// ============================================================================

#[test]
fn test_health_reports_invalid_data() {
    let (layer, store, _) = memory_layer();
    layer.save_progress(&progress()).unwrap();
    store.insert_raw(RESULTS_KEY, "{}");

    let reports = layer.health_all();
    assert_eq!(reports.len(), 2);
    assert!(reports[0].available && reports[0].has_data && reports[0].data_valid);
    assert!(reports[1].has_data);
    assert!(!reports[1].data_valid);
    assert!(!reports[1].errors.is_empty());
}

#[test]
fn test_repair_all_removes_only_invalid_records() {
    let (layer, store, _) = memory_layer();
    layer.save_progress(&progress()).unwrap();
    store.insert_raw(RESULTS_KEY, "{\"results\": 1}");

    let reports = layer.repair_all();
    assert!(reports.iter().all(|r| r.success));
    assert!(store.raw(RESULTS_KEY).is_none());
    assert_eq!(layer.load_progress().unwrap(), Some(progress()));
}

// ============================================================================
// Persistent backends
// ============================================================================

#[test]
fn test_file_store_roundtrip_and_heal() {
    let dir = tempfile::tempdir().unwrap();
    let (layer, _) = layer_over(Box::new(FileStore::new(dir.path()).unwrap()));

    layer.save_results(&basic_results()).unwrap();
    layer.save_progress(&progress()).unwrap();
    assert_eq!(layer.load_progress().unwrap(), Some(progress()));

    // Damage the file through a second handle on the same directory
    let other = FileStore::new(dir.path()).unwrap();
    other.set(RESULTS_KEY, "garbage").unwrap();

    let health = layer.health::<ResultsRecord>(RESULTS_KEY);
    assert!(health.available);
    assert!(!health.data_valid);

    let err = layer.load_results().unwrap_err();
    assert_eq!(err.kind, StorageErrorKind::CorruptedData);
    assert_eq!(other.get(RESULTS_KEY).unwrap(), None);
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (layer, _) = layer_over(Box::new(FileStore::new(dir.path()).unwrap()));
        layer.save_progress(&progress()).unwrap();
    }
    let (layer, _) = layer_over(Box::new(FileStore::new(dir.path()).unwrap()));
    assert_eq!(layer.load_progress().unwrap(), Some(progress()));
}

#[test]
fn test_sqlite_store_roundtrip_and_repair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("assessment.db");
    let (layer, reporter) = layer_over(Box::new(SqliteStore::new(path.clone()).unwrap()));

    let results = basic_results();
    layer.save_results(&results).unwrap();
    assert_eq!(layer.load_results().unwrap(), Some(results));

    let other = SqliteStore::new(path).unwrap();
    other
        .set(PROGRESS_KEY, &json!({ "answers": [] }).to_string())
        .unwrap();

    let report = layer.repair::<ProgressRecord>(PROGRESS_KEY);
    assert!(report.success);
    assert_eq!(report.actions.len(), 1);
    assert_eq!(other.get(PROGRESS_KEY).unwrap(), None);
    assert!(reporter.is_empty());

    let health = layer.health::<ProgressRecord>(PROGRESS_KEY);
    assert!(health.available && !health.has_data && health.data_valid);
}

#[test]
fn test_answers_with_every_value_shape_persist() {
    let (layer, _, _) = memory_layer();
    let record = ProgressRecord {
        answers: vec![
            Answer::new("work_pace", 6),
            Answer::new("stress_response", "Talk it through with someone I trust"),
            Answer::new("interest_areas", vec!["Technology", "Arts"]),
        ],
        current_question_index: -1,
    };
    layer.save_progress(&record).unwrap();
    assert_eq!(layer.load_progress().unwrap(), Some(record));
}

//! Storage error taxonomy

use career_compass_sdk::BackendError;
use std::fmt;

/// Classification of every persistence failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    /// Store not present at all
    Unavailable,
    QuotaExceeded,
    /// Stored payload is not parseable
    CorruptedData,
    /// Payload parses but fails structural validation
    ValidationFailed,
    /// Raw-text parse failure, handled like `CorruptedData`
    ParseError,
    PermissionDenied,
    NetworkError,
    UnknownError,
}

impl StorageErrorKind {
    pub const ALL: [StorageErrorKind; 8] = [
        StorageErrorKind::Unavailable,
        StorageErrorKind::QuotaExceeded,
        StorageErrorKind::CorruptedData,
        StorageErrorKind::ValidationFailed,
        StorageErrorKind::ParseError,
        StorageErrorKind::PermissionDenied,
        StorageErrorKind::NetworkError,
        StorageErrorKind::UnknownError,
    ];

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorKind::Unavailable => "UNAVAILABLE",
            StorageErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            StorageErrorKind::CorruptedData => "CORRUPTED_DATA",
            StorageErrorKind::ValidationFailed => "VALIDATION_FAILED",
            StorageErrorKind::ParseError => "PARSE_ERROR",
            StorageErrorKind::PermissionDenied => "PERMISSION_DENIED",
            StorageErrorKind::NetworkError => "NETWORK_ERROR",
            StorageErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Fixed message suitable for showing to the person taking the assessment
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageErrorKind::Unavailable => {
                "Local storage is not available. Your progress cannot be saved on this device."
            }
            StorageErrorKind::QuotaExceeded => {
                "Storage is full. Old assessment data was removed to make room; please try again."
            }
            StorageErrorKind::CorruptedData => {
                "Saved assessment data was damaged and has been cleared."
            }
            StorageErrorKind::ValidationFailed => {
                "Saved assessment data was incomplete or out of date and has been cleared."
            }
            StorageErrorKind::ParseError => "Saved assessment data could not be read.",
            StorageErrorKind::PermissionDenied => {
                "Permission to store data was denied. Check your storage settings."
            }
            StorageErrorKind::NetworkError => {
                "A temporary connection problem occurred. Please try again."
            }
            StorageErrorKind::UnknownError => "An unexpected storage error occurred. Please try again.",
        }
    }

    /// Whether a retry or repair can fix the failure
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            StorageErrorKind::Unavailable | StorageErrorKind::PermissionDenied
        )
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Typed persistence failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}: {}", .kind.code(), .detail)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub detail: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn corrupted(detail: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::CorruptedData, detail)
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::ValidationFailed, detail)
    }

    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl From<BackendError> for StorageError {
    fn from(err: BackendError) -> Self {
        let kind = match &err {
            BackendError::Unavailable(_) => StorageErrorKind::Unavailable,
            BackendError::QuotaExceeded => StorageErrorKind::QuotaExceeded,
            BackendError::PermissionDenied(_) => StorageErrorKind::PermissionDenied,
            BackendError::Network(_) => StorageErrorKind::NetworkError,
            BackendError::Other(_) => StorageErrorKind::UnknownError,
        };
        Self::new(kind, err.to_string())
    }
}

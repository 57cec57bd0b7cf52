//! Classified storage errors.
//!
//! Every failure crossing the storage boundary is a [`StorageError`] tagged
//! with a [`StorageErrorKind`]. The kind alone decides retry policy via
//! [`is_retryable`](StorageError::is_retryable) so the orchestrator never
//! string-matches messages, and [`user_message`](StorageError::user_message)
//! is the only text that may reach the UI.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Closed set of storage failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    DatabaseNotInitialized,
    DatabaseConnectionFailed,
    DatabaseQueryFailed,
    DatabaseTransactionFailed,
    DataNotFound,
    DataValidationFailed,
    DataSerializationFailed,
    DataDeserializationFailed,
    PermissionDenied,
    StorageQuotaExceeded,
    Network,
    Timeout,
    Unknown,
    OperationFailed,
}

impl StorageErrorKind {
    /// Stable wire code used in structured logs and persisted error reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseNotInitialized => "DATABASE_NOT_INITIALIZED",
            Self::DatabaseConnectionFailed => "DATABASE_CONNECTION_FAILED",
            Self::DatabaseQueryFailed => "DATABASE_QUERY_FAILED",
            Self::DatabaseTransactionFailed => "DATABASE_TRANSACTION_FAILED",
            Self::DataNotFound => "DATA_NOT_FOUND",
            Self::DataValidationFailed => "DATA_VALIDATION_FAILED",
            Self::DataSerializationFailed => "DATA_SERIALIZATION_FAILED",
            Self::DataDeserializationFailed => "DATA_DESERIALIZATION_FAILED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::StorageQuotaExceeded => "STORAGE_QUOTA_EXCEEDED",
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
            Self::OperationFailed => "OPERATION_FAILED",
        }
    }

    /// Parse a wire code back.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DATABASE_NOT_INITIALIZED" => Some(Self::DatabaseNotInitialized),
            "DATABASE_CONNECTION_FAILED" => Some(Self::DatabaseConnectionFailed),
            "DATABASE_QUERY_FAILED" => Some(Self::DatabaseQueryFailed),
            "DATABASE_TRANSACTION_FAILED" => Some(Self::DatabaseTransactionFailed),
            "DATA_NOT_FOUND" => Some(Self::DataNotFound),
            "DATA_VALIDATION_FAILED" => Some(Self::DataValidationFailed),
            "DATA_SERIALIZATION_FAILED" => Some(Self::DataSerializationFailed),
            "DATA_DESERIALIZATION_FAILED" => Some(Self::DataDeserializationFailed),
            "PERMISSION_DENIED" => Some(Self::PermissionDenied),
            "STORAGE_QUOTA_EXCEEDED" => Some(Self::StorageQuotaExceeded),
            "NETWORK_ERROR" => Some(Self::Network),
            "TIMEOUT_ERROR" => Some(Self::Timeout),
            "UNKNOWN_ERROR" => Some(Self::Unknown),
            "OPERATION_FAILED" => Some(Self::OperationFailed),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure from the storage boundary.
///
/// Carries where it happened (`repository`/`operation`) and when, for
/// structured logs; the technical `message` never reaches end users.
#[derive(Debug, Clone, Error)]
#[error("{kind} in {repository}::{operation}: {message}")]
pub struct StorageError {
    kind: StorageErrorKind,
    message: String,
    operation: String,
    repository: String,
    occurred_at: DateTime<Utc>,
}

impl StorageError {
    /// Build an error of an arbitrary kind, stamped with the current time.
    pub fn new(
        kind: StorageErrorKind,
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: operation.into(),
            repository: repository.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Technical message, for logs only.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the storage operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Name of the store or repository the operation ran against.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Whether this failure is transient and worth retrying.
    ///
    /// Queries and whole operations can fail on contention, and network and
    /// timeout failures resolve themselves; everything else (missing data,
    /// bad data, permissions, quota) will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            StorageErrorKind::Network
                | StorageErrorKind::Timeout
                | StorageErrorKind::DatabaseQueryFailed
                | StorageErrorKind::OperationFailed
        )
    }

    /// Fixed, non-technical sentence for the UI.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            StorageErrorKind::DatabaseNotInitialized => {
                "Storage is not ready yet. Please restart the app."
            }
            StorageErrorKind::DatabaseConnectionFailed => {
                "Could not open local storage. Please restart the app."
            }
            StorageErrorKind::DatabaseQueryFailed => {
                "Could not read your saved data. Please try again."
            }
            StorageErrorKind::DatabaseTransactionFailed => {
                "Could not save your changes. Please try again."
            }
            StorageErrorKind::DataNotFound => "The requested item could not be found.",
            StorageErrorKind::DataValidationFailed => {
                "Some saved data looks invalid and could not be used."
            }
            StorageErrorKind::DataSerializationFailed => "Your changes could not be saved.",
            StorageErrorKind::DataDeserializationFailed => "Some saved data could not be read.",
            StorageErrorKind::PermissionDenied => {
                "The app does not have permission to access storage."
            }
            StorageErrorKind::StorageQuotaExceeded => {
                "Your device is out of storage space. Free up some space and try again."
            }
            StorageErrorKind::Network => {
                "No connection. Your images will sync when you are back online."
            }
            StorageErrorKind::Timeout => "The request took too long. Please try again.",
            StorageErrorKind::Unknown | StorageErrorKind::OperationFailed => {
                "Something went wrong. Please try again."
            }
        }
    }
}

// One factory per kind so call sites read as the failure they report.
impl StorageError {
    pub fn database_not_initialized(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DatabaseNotInitialized,
            message,
            operation,
            repository,
        )
    }

    pub fn database_connection_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DatabaseConnectionFailed,
            message,
            operation,
            repository,
        )
    }

    pub fn database_query_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DatabaseQueryFailed,
            message,
            operation,
            repository,
        )
    }

    pub fn database_transaction_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DatabaseTransactionFailed,
            message,
            operation,
            repository,
        )
    }

    /// A key or record that was expected to exist is missing.
    pub fn data_not_found(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(StorageErrorKind::DataNotFound, message, operation, repository)
    }

    pub fn data_validation_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DataValidationFailed,
            message,
            operation,
            repository,
        )
    }

    pub fn data_serialization_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DataSerializationFailed,
            message,
            operation,
            repository,
        )
    }

    pub fn data_deserialization_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::DataDeserializationFailed,
            message,
            operation,
            repository,
        )
    }

    pub fn permission_denied(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::PermissionDenied,
            message,
            operation,
            repository,
        )
    }

    pub fn storage_quota_exceeded(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::StorageQuotaExceeded,
            message,
            operation,
            repository,
        )
    }

    /// The device is offline or the remote end is unreachable.
    pub fn network(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(StorageErrorKind::Network, message, operation, repository)
    }

    pub fn timeout(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(StorageErrorKind::Timeout, message, operation, repository)
    }

    pub fn unknown(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(StorageErrorKind::Unknown, message, operation, repository)
    }

    pub fn operation_failed(
        message: impl Into<String>,
        operation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self::new(
            StorageErrorKind::OperationFailed,
            message,
            operation,
            repository,
        )
    }
}

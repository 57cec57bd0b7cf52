//! Validation failures for the reconciliation core.
//!
//! These are the synchronous, never-retried argument violations: callers get
//! one immediately and are expected not to repeat the call. Classified
//! storage-boundary failures live in [`crate::storage::StorageError`] instead.

use thiserror::Error;

/// An argument or field violated a documented constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required string was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A numeric field fell outside its permitted range.
    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        range: &'static str,
    },

    /// A media type that is not on the supported-format allow-list.
    #[error("unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// A status snapshot whose buckets do not add up to its total.
    #[error("inconsistent status counts: total {total}, buckets sum to {sum}")]
    InconsistentCounts { total: u64, sum: u64 },

    /// Several constraints violated by a single call, reported together.
    #[error("{}", join_faults(.0))]
    Faults(Vec<ValidationError>),
}

impl ValidationError {
    /// Build an [`OutOfRange`](Self::OutOfRange) fault from any displayable value.
    pub fn out_of_range(field: &'static str, value: impl ToString, range: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            range,
        }
    }

    /// Collapse a fault list: one fault stays bare, several wrap in
    /// [`Faults`](Self::Faults).
    ///
    /// Callers must pass a non-empty list; an empty one means nothing was
    /// violated and no error should be built at all.
    pub fn from_faults(mut faults: Vec<ValidationError>) -> Self {
        debug_assert!(!faults.is_empty(), "from_faults called with no faults");
        if faults.len() == 1 {
            faults.remove(0)
        } else {
            Self::Faults(faults)
        }
    }

    /// Number of individual violations carried by this error.
    pub fn fault_count(&self) -> usize {
        match self {
            Self::Faults(faults) => faults.len(),
            _ => 1,
        }
    }
}

fn join_faults(faults: &[ValidationError]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_field_display() {
        let e = ValidationError::EmptyField { field: "local_uri" };
        assert_eq!(e.to_string(), "local_uri must not be empty");
    }

    #[test]
    fn test_out_of_range_display() {
        let e = ValidationError::out_of_range("max_retries", 101, "1..=100");
        assert_eq!(e.to_string(), "max_retries must be in 1..=100, got 101");
    }

    #[test]
    fn test_from_faults_single_stays_bare() {
        let e = ValidationError::from_faults(vec![ValidationError::EmptyField {
            field: "file_name",
        }]);
        assert_eq!(e, ValidationError::EmptyField { field: "file_name" });
        assert_eq!(e.fault_count(), 1);
    }

    #[test]
    fn test_from_faults_many_joined_in_display() {
        let e = ValidationError::from_faults(vec![
            ValidationError::out_of_range("batch_size", 0, "1..=100"),
            ValidationError::UnsupportedFormat {
                format: "video/mp4".to_string(),
            },
        ]);
        assert_eq!(e.fault_count(), 2);
        let text = e.to_string();
        assert!(text.contains("batch_size"), "missing first fault: {text}");
        assert!(text.contains("video/mp4"), "missing second fault: {text}");
        assert!(text.contains("; "), "faults not joined: {text}");
    }
}

//! Error helpers for adplace-store
//!
//! Every failure leaving this crate is an `ExError`. rusqlite failures become
//! `Storage`, except parameter binding mismatches, which are query
//! construction defects and become `QueryBuild`. Constraint violations stay
//! `Storage` but are not transient.

use adplace_core::errors::{ExError, ExErrorKind};
use rusqlite::ErrorCode;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Map a rusqlite failure raised during `op`
pub fn from_rusqlite(op: &str, err: rusqlite::Error) -> ExError {
    match &err {
        rusqlite::Error::InvalidParameterCount(_, _) | rusqlite::Error::InvalidParameterName(_) => {
            ExError::new(ExErrorKind::QueryBuild)
                .with_op(op)
                .with_message(err.to_string())
        }
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            storage(op, err.to_string()).with_transient(false)
        }
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted => {
            storage(op, "statement interrupted: operation cancelled or past its deadline")
        }
        _ => storage(op, err.to_string()),
    }
}

/// A query or update could not be assembled
pub fn query_build(op: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::QueryBuild)
        .with_op(op)
        .with_message(reason)
}

/// No record with the given id
pub fn not_found(op: &str, id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op)
        .with_entity_id(id)
        .with_message("advertisement not found")
}

/// Generic storage failure with a free-form reason
pub fn storage(op: &str, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op(op)
        .with_message(reason)
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op("migration")
        .with_entity_id(migration_id)
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// An applied migration no longer matches its embedded SQL
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_count_is_query_build() {
        let err = from_rusqlite("select_ads", rusqlite::Error::InvalidParameterCount(2, 3));
        assert_eq!(err.kind(), ExErrorKind::QueryBuild);
        assert_eq!(err.op(), Some("select_ads"));
    }

    #[test]
    fn test_constraint_violation_is_permanent_storage() {
        let err = from_rusqlite(
            "insert_ad",
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
                Some("UNIQUE constraint failed: ads.id".to_string()),
            ),
        );
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_interrupt_is_storage() {
        let err = from_rusqlite(
            "select_ads",
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
                None,
            ),
        );
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert!(err.message().contains("interrupted"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_failures_are_storage() {
        let err = from_rusqlite("insert_ad", rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ExErrorKind::Storage);
    }
}

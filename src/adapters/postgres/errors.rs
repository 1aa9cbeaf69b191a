use crate::domain::ValueError;
use crate::ports::StoreError;
use sqlx::error::ErrorKind;

/// SQLSTATE for `serialization_failure`
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";

/// Map a sqlx error to a port error.
///
/// Serialization failures and deadlocks become `StoreError::Conflict` so the
/// service can retry them; everything else is a backend failure.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED {
                return StoreError::Conflict;
            }
        }
    }
    StoreError::backend(err)
}

/// A stored value failed domain validation on the way out.
pub(crate) fn invalid_data(err: ValueError) -> StoreError {
    StoreError::backend(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        err.to_string(),
    ))
}

/// Constraint violated by a failed statement, if any.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<(ErrorKind, String)> {
    match err {
        sqlx::Error::Database(db_err) => match db_err.kind() {
            kind @ (ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation) => {
                Some((kind, db_err.constraint().unwrap_or_default().to_string()))
            }
            _ => None,
        },
        _ => None,
    }
}

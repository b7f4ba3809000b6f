//! Error types for roster operations.

use sea_orm::{DbErr, SqlErr};

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Errors raised by roster entities and the store behind them.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// An entity invariant was violated before the store was touched.
    #[error("validation error: {0}")]
    Validation(String),

    /// A unique or foreign-key constraint rejected the write.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("database error: {0}")]
    Database(DbErr),
}

impl RosterError {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, RosterError::IntegrityViolation(_))
    }
}

impl From<DbErr> for RosterError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => RosterError::IntegrityViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                RosterError::IntegrityViolation(msg)
            }
            _ => RosterError::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = RosterError::Validation("missing required fields: email".into());
        assert_eq!(
            err.to_string(),
            "validation error: missing required fields: email"
        );
        assert!(!err.is_integrity_violation());
    }

    #[test]
    fn test_generic_db_error_is_not_integrity() {
        let err = RosterError::from(DbErr::Custom("connection refused".into()));
        assert!(matches!(err, RosterError::Database(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}

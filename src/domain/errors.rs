//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use std::fmt;

use sea_orm::{DbErr, SqlErr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found
    NotFound,
    /// Validation error with message
    Validation(String),
    /// A row with the same primary key already exists
    Conflict(String),
    /// Referential integrity failure, possibly reported at commit
    Constraint(String),
    /// Database/persistence error
    Database(String),
    /// Generic internal error
    Internal(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound => write!(f, "Resource not found"),
            DomainError::Validation(msg) => write!(f, "Validation error: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Constraint(msg) => write!(f, "Constraint violation: {}", msg),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => return DomainError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return DomainError::Constraint(msg);
            }
            _ => {}
        }

        // A deferred check that fails on COMMIT is not always surfaced with
        // its extended result code, so fall back to SQLite's message text.
        let msg = e.to_string();
        if msg.contains("FOREIGN KEY constraint failed") {
            DomainError::Constraint(msg)
        } else if msg.contains("UNIQUE constraint failed") {
            DomainError::Conflict(msg)
        } else if matches!(e, DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated) {
            DomainError::NotFound
        } else {
            DomainError::Database(msg)
        }
    }
}

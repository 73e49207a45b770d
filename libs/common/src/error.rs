//! Custom error types for the common library
//!
//! This module defines the database error shared by every service, along
//! with a classification of the integrity-constraint failures that callers
//! translate into domain errors.

use sqlx::Error as SqlxError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while preparing the schema
    #[error("Database migration error: {0}")]
    Migration(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Integrity constraint that rejected a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// A primary key or unique index already holds the value
    Unique,
    /// A referenced row does not exist
    ForeignKey,
}

impl DatabaseError {
    /// Classify the failure when the store rejected the statement on a constraint
    pub fn constraint_violation(&self) -> Option<ConstraintViolation> {
        let DatabaseError::Query(SqlxError::Database(db_err)) = self else {
            return None;
        };

        match db_err.kind() {
            ErrorKind::UniqueViolation => Some(ConstraintViolation::Unique),
            ErrorKind::ForeignKeyViolation => Some(ConstraintViolation::ForeignKey),
            _ => None,
        }
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

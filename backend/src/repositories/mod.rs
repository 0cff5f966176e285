//! Database repositories
//!
//! Each store is a trait so services can run against PostgreSQL in
//! production and against in-memory doubles in tests.

pub mod book;
pub mod user;

pub use book::{BookDraft, BookRecord, BookStore, PgBookRepository};
pub use user::{NewUser, PasswordChange, PgUserRepository, UserDraft, UserRecord, UserStore};

use crate::error::ApiError;
use thiserror::Error;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Failure reported by a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Column guarded by a `<table>_<column>_key` unique constraint
pub fn conflict_column(constraint: &str) -> Option<String> {
    constraint
        .strip_suffix("_key")?
        .split_once('_')
        .map(|(_, column)| column.to_string())
        .filter(|column| !column.is_empty())
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                ApiError::Conflict(conflict_column(&constraint).unwrap_or(constraint))
            }
            StoreError::Database(e) => ApiError::Database(e),
        }
    }
}

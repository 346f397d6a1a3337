//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a request is rejected before touching storage.
//! - [`KeyNotFound`] thrown when an account, entry or transfer is not found.
//! - [`Commit`] and [`RolledBack`] thrown when the transaction itself fails.
//! - [`Concurrency`] thrown when the store reports a transient lock or
//!   serialization failure. The engine never retries these.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Commit`]: EngineError::Commit
//!  [`RolledBack`]: EngineError::RolledBack
//!  [`Concurrency`]: EngineError::Concurrency
use std::time::Duration;

use sea_orm::{ConnAcquireErr, DbErr, RuntimeErr, SqlErr, sqlx};
use thiserror::Error;

/// SQLSTATE / driver codes the store uses for transient lock conflicts.
///
/// - Postgres: serialization failure, deadlock detected, lock not available.
/// - SQLite: `SQLITE_BUSY`, `SQLITE_LOCKED`, `SQLITE_BUSY_SNAPSHOT`.
const TRANSIENT_CODES: &[&str] = &["40001", "40P01", "55P03", "5", "6", "517"];

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("transaction commit failed: {0}")]
    Commit(DbErr),
    #[error("{cause}; rollback failed: {rollback}")]
    RolledBack {
        cause: Box<EngineError>,
        rollback: DbErr,
    },
    #[error("transient storage conflict: {0}")]
    Concurrency(DbErr),
    #[error("transaction exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns `true` if a caller-level retry of the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Concurrency(_) | Self::DeadlineExceeded(_) => true,
            Self::RolledBack { cause, .. } => cause.is_transient(),
            _ => false,
        }
    }
}

fn driver_code(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return None,
    };
    let RuntimeErr::SqlxError(sqlx_err) = runtime else {
        return None;
    };
    match sqlx_err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

fn is_transient_db_err(err: &DbErr) -> bool {
    if matches!(err, DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) {
        return true;
    }
    driver_code(err).is_some_and(|code| TRANSIENT_CODES.contains(&code.as_str()))
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::ForeignKeyConstraintViolation(msg)) = err.sql_err() {
            return Self::KeyNotFound(msg);
        }
        if is_transient_db_err(&err) {
            return Self::Concurrency(err);
        }
        Self::Database(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Commit(a), Self::Commit(b)) => a.to_string() == b.to_string(),
            (
                Self::RolledBack {
                    cause: a,
                    rollback: ra,
                },
                Self::RolledBack {
                    cause: b,
                    rollback: rb,
                },
            ) => a == b && ra.to_string() == rb.to_string(),
            (Self::Concurrency(a), Self::Concurrency(b)) => a.to_string() == b.to_string(),
            (Self::DeadlineExceeded(a), Self::DeadlineExceeded(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

//! Atomic execution on top of the connection pool.

use std::{future::Future, pin::Pin, time::Duration};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{EngineError, Queries, ResultEngine};

/// Future returned by the unit of work passed to [`LedgerStore::execute_atomic`].
pub type AtomicFuture<'c, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'c>>;

/// Owner of the connection pool.
///
/// Every multi-statement write goes through [`execute_atomic`], which hands
/// the caller a transaction-scoped [`Queries`] and commits or rolls back as a
/// unit.
///
/// [`execute_atomic`]: LedgerStore::execute_atomic
#[derive(Clone, Debug)]
pub struct LedgerStore {
    database: DatabaseConnection,
    transaction_timeout: Option<Duration>,
}

impl LedgerStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            transaction_timeout: None,
        }
    }

    /// Abandon (and roll back) any transaction whose work runs longer than
    /// `timeout`. The commit itself is never interrupted.
    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = Some(timeout);
        self
    }

    /// Accessor bound to the pool, outside of any explicit transaction.
    pub fn queries(&self) -> Queries<'_, DatabaseConnection> {
        Queries::new(&self.database)
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    /// Runs `work` inside one database transaction.
    ///
    /// - `Ok` from `work`: the transaction is committed; a commit failure is
    ///   returned as [`EngineError::Commit`] (or [`EngineError::Concurrency`]
    ///   for a transient conflict).
    /// - `Err` from `work`: the transaction is rolled back and the error is
    ///   returned unchanged. If the rollback fails too, both are returned in
    ///   [`EngineError::RolledBack`].
    /// - `work` still running when the transaction timeout elapses: it is
    ///   dropped and the transaction rolled back with
    ///   [`EngineError::DeadlineExceeded`].
    ///
    /// The deadline bounds `work` only. Once `work` has succeeded the commit
    /// always runs to completion, so a `DeadlineExceeded` guarantees nothing
    /// was committed.
    ///
    /// The transaction uses the connection's default isolation level. The
    /// `DatabaseTransaction` handle rolls back when dropped, so a panic in
    /// `work` or dropping the returned future (caller cancellation) never
    /// commits partial work.
    pub async fn execute_atomic<T, F>(&self, work: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'c> FnOnce(Queries<'c, DatabaseTransaction>) -> AtomicFuture<'c, T> + Send,
    {
        let db_tx = self.database.begin().await?;
        tracing::debug!("transaction started");

        let result = match self.transaction_timeout {
            Some(limit) => tokio::time::timeout(limit, work(Queries::new(&db_tx)))
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!(?limit, "transaction deadline exceeded");
                    Err(EngineError::DeadlineExceeded(limit))
                }),
            None => work(Queries::new(&db_tx)).await,
        };

        match result {
            Ok(value) => {
                db_tx.commit().await.map_err(|err| match EngineError::from(err) {
                    EngineError::Database(err) => EngineError::Commit(err),
                    other => other,
                })?;
                tracing::debug!("transaction committed");
                Ok(value)
            }
            Err(cause) => match db_tx.rollback().await {
                Ok(()) => {
                    tracing::debug!(error = %cause, "transaction rolled back");
                    Err(cause)
                }
                Err(rollback) => {
                    tracing::warn!(error = %cause, %rollback, "rollback failed");
                    Err(EngineError::RolledBack {
                        cause: Box::new(cause),
                        rollback,
                    })
                }
            },
        }
    }
}

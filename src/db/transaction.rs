//! Transactions started from a [`Database`](crate::db::Database).
//!
//! sqlx transactions roll themselves back when dropped. tokio-postgres
//! transactions are plain `BEGIN`/`COMMIT` on a pooled connection, so an
//! abandoned one is rolled back from a spawned task before the connection
//! returns to the pool.

use crate::db::params::{
    bind_mysql_param, bind_postgres_param, bind_sqlite_param, tokio_pg_params,
};
use crate::db::pool::with_deadline;
use crate::error::{DriverError, DriverResult, Sentinel};
use crate::models::QueryParam;
use sqlx::{MySql, Postgres, Sqlite};
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) enum TxState {
    Postgres(sqlx::Transaction<'static, Postgres>),
    TokioPostgres(deadpool_postgres::Object),
    MySql(sqlx::Transaction<'static, MySql>),
    SQLite(sqlx::Transaction<'static, Sqlite>),
}

impl TxState {
    fn name(&self) -> &'static str {
        match self {
            TxState::Postgres(_) => "Postgres",
            TxState::TokioPostgres(_) => "TokioPostgres",
            TxState::MySql(_) => "MySql",
            TxState::SQLite(_) => "SQLite",
        }
    }
}

/// An open transaction.
///
/// Once committed or rolled back, every further call fails with
/// [`Sentinel::TxDone`].
pub struct Transaction {
    state: Option<TxState>,
    query_timeout: Option<Duration>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("backend", &self.state.as_ref().map(TxState::name))
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl Transaction {
    pub(crate) fn new(state: TxState, query_timeout: Option<Duration>) -> Self {
        Self {
            state: Some(state),
            query_timeout,
        }
    }

    /// Whether the transaction has been committed or rolled back.
    pub fn is_finished(&self) -> bool {
        self.state.is_none()
    }

    /// Execute a statement inside the transaction.
    pub async fn execute(&mut self, sql: &str, params: &[QueryParam]) -> DriverResult<u64> {
        let state = self.state.as_mut().ok_or(Sentinel::TxDone)?;
        with_deadline(self.query_timeout, async move {
            let rows = match state {
                TxState::Postgres(tx) => {
                    let mut query = sqlx::query(sql);
                    for param in params {
                        query = bind_postgres_param(query, param);
                    }
                    query.execute(&mut **tx).await?.rows_affected()
                }
                TxState::MySql(tx) => {
                    let mut query = sqlx::query(sql);
                    for param in params {
                        query = bind_mysql_param(query, param);
                    }
                    query.execute(&mut **tx).await?.rows_affected()
                }
                TxState::SQLite(tx) => {
                    let mut query = sqlx::query(sql);
                    for param in params {
                        query = bind_sqlite_param(query, param);
                    }
                    query.execute(&mut **tx).await?.rows_affected()
                }
                TxState::TokioPostgres(client) => {
                    client.execute(sql, &tokio_pg_params(params)).await?
                }
            };
            Ok::<_, DriverError>(rows)
        })
        .await
    }

    /// Commit the transaction.
    pub async fn commit(&mut self) -> DriverResult<()> {
        match self.state.take().ok_or(Sentinel::TxDone)? {
            TxState::Postgres(tx) => tx.commit().await?,
            TxState::MySql(tx) => tx.commit().await?,
            TxState::SQLite(tx) => tx.commit().await?,
            TxState::TokioPostgres(client) => {
                if let Err(e) = client.batch_execute("COMMIT").await {
                    // Never hand a connection with an open transaction back to the pool.
                    if let Err(rollback_err) = client.batch_execute("ROLLBACK").await {
                        warn!(
                            error = %rollback_err,
                            "Rollback after failed commit failed; discarding its connection"
                        );
                        drop(deadpool_postgres::Object::take(client));
                    }
                    return Err(e.into());
                }
            }
        }
        debug!("Transaction committed");
        Ok(())
    }

    /// Roll the transaction back.
    pub async fn rollback(&mut self) -> DriverResult<()> {
        match self.state.take().ok_or(Sentinel::TxDone)? {
            TxState::Postgres(tx) => tx.rollback().await?,
            TxState::MySql(tx) => tx.rollback().await?,
            TxState::SQLite(tx) => tx.rollback().await?,
            TxState::TokioPostgres(client) => {
                if let Err(e) = client.batch_execute("ROLLBACK").await {
                    drop(deadpool_postgres::Object::take(client));
                    return Err(e.into());
                }
            }
        }
        debug!("Transaction rolled back");
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let Some(TxState::TokioPostgres(client)) = self.state.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match client.batch_execute("ROLLBACK").await {
                        Ok(()) => debug!("Dropped transaction rolled back"),
                        Err(e) => warn!(error = %e, "Failed to roll back dropped transaction"),
                    }
                });
            }
            Err(_) => {
                warn!("Transaction dropped outside a runtime; discarding its connection");
                drop(deadpool_postgres::Object::take(client));
            }
        }
    }
}

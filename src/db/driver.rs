//! Driver adapter capability.
//!
//! Each backend implements [`Driver`] once. The trait is object safe so the
//! unified [`Database`](crate::db::Database) handle can hold any adapter
//! behind a `Box<dyn Driver>`.
//!
//! Classification walks the error and its `source()` chain looking for typed
//! errors, the way callers would use `downcast_ref`. Universal sentinels are
//! always checked before any backend table.

use crate::db::pool::DbPool;
use crate::error::Sentinel;
use crate::models::{Dialect, ErrorKind};
use std::error::Error;
use std::fmt::Debug;

/// Error reference accepted by the classification methods.
pub type ErrorRef<'e> = &'e (dyn Error + 'static);

/// Backend adapter: error classification, dialect reporting and error details.
pub trait Driver: Send + Sync + Debug {
    /// Short name of the client library, e.g. `"sqlx-postgres"`.
    fn driver_name(&self) -> &'static str;

    /// Dialect detected when the connection was opened.
    ///
    /// Single-dialect adapters return a constant.
    fn dialect(&self) -> Dialect;

    /// Raw output of the version probe, if one was run.
    fn server_version(&self) -> Option<&str>;

    /// Map an error onto the portable taxonomy.
    ///
    /// `None` yields [`ErrorKind::NoError`]; anything unrecognized yields
    /// [`ErrorKind::Unknown`]. Never fails.
    fn classify(&self, err: Option<ErrorRef<'_>>) -> ErrorKind;

    /// Whether the backend reports column, table and constraint names.
    fn has_error_details(&self) -> bool;

    /// Column named by the error, or `""`.
    fn error_column<'e>(&self, err: Option<ErrorRef<'e>>) -> &'e str;

    /// Table named by the error, or `""`.
    fn error_table<'e>(&self, err: Option<ErrorRef<'e>>) -> &'e str;

    /// Constraint named by the error, or `""`.
    fn error_constraint<'e>(&self, err: Option<ErrorRef<'e>>) -> &'e str;

    /// Pool owned by the adapter. Detached adapters have none.
    fn pool(&self) -> Option<&DbPool>;
}

/// Iterate over an error and all of its sources.
pub fn error_chain<'e>(err: ErrorRef<'e>) -> impl Iterator<Item = ErrorRef<'e>> {
    std::iter::successors(Some(err), |&e| e.source())
}

/// First error of type `T` in the chain.
pub fn find_in_chain<'e, T: Error + 'static>(err: ErrorRef<'e>) -> Option<&'e T> {
    error_chain(err).find_map(|e| e.downcast_ref::<T>())
}

/// First `sqlx::error::DatabaseError` carried by a `sqlx::Error` in the chain.
pub(crate) fn find_sqlx_database_error<'e>(
    err: ErrorRef<'e>,
) -> Option<&'e (dyn sqlx::error::DatabaseError + 'static)> {
    error_chain(err).find_map(|e| match e.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => Some(&**db_err),
        _ => None,
    })
}

/// Kind of a universal sentinel condition, checked ahead of backend tables.
///
/// The whole chain is scanned for "no rows", then for "transaction done",
/// then for deadlines, so a wrapped no-rows error is never reported as a
/// timeout.
pub fn sentinel_kind(err: ErrorRef<'_>) -> Option<ErrorKind> {
    if error_chain(err).any(is_no_rows) {
        return Some(ErrorKind::NotFound);
    }
    if error_chain(err).any(|e| e.downcast_ref::<Sentinel>() == Some(&Sentinel::TxDone)) {
        return Some(ErrorKind::TxDone);
    }
    if error_chain(err).any(is_deadline) {
        return Some(ErrorKind::Timeout);
    }
    None
}

fn is_no_rows(err: ErrorRef<'_>) -> bool {
    matches!(err.downcast_ref::<Sentinel>(), Some(Sentinel::NoRows))
        || matches!(err.downcast_ref::<sqlx::Error>(), Some(sqlx::Error::RowNotFound))
}

fn is_deadline(err: ErrorRef<'_>) -> bool {
    matches!(
        err.downcast_ref::<Sentinel>(),
        Some(Sentinel::DeadlineExceeded)
    ) || err.downcast_ref::<tokio::time::error::Elapsed>().is_some()
        || matches!(
            err.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::PoolTimedOut)
        )
        || matches!(
            err.downcast_ref::<deadpool_postgres::PoolError>(),
            Some(deadpool_postgres::PoolError::Timeout(_))
        )
}

/// Two-character SQLSTATE class of a five-character code.
pub(crate) fn sqlstate_class(code: &str) -> Option<&str> {
    if code.len() == 5 && code.is_ascii() {
        Some(&code[..2])
    } else {
        None
    }
}

//! Database adapters and the unified handle.
//!
//! This module provides:
//! - The [`Driver`] capability implemented by every backend adapter
//! - Adapters for sqlx PostgreSQL, tokio-postgres, sqlx MySQL and sqlx SQLite
//! - The [`Database`] handle and its transactions
//! - The URL scheme registry

#[macro_use]
pub mod macros;
pub mod driver;
pub mod mysql;
mod params;
pub mod pool;
pub mod postgres;
pub mod registry;
pub mod sqlite;
pub mod tokio_pg;
pub mod transaction;

pub use driver::{Driver, ErrorRef, error_chain, find_in_chain, sentinel_kind};
pub use mysql::{MySqlDriver, MySqlOpener};
pub use pool::{Database, DbPool, PoolStatus};
pub use postgres::{PgDriver, PgOpener};
pub use registry::{SchemeRegistry, UrlOpener};
pub use sqlite::{SqliteDriver, SqliteOpener};
pub use tokio_pg::{TokioPgDriver, TokioPgOpener};
pub use transaction::Transaction;

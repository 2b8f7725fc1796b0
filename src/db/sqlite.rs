//! SQLite adapter backed by sqlx.
//!
//! SQLite has no SQLSTATE. sqlx reports the extended result code as the
//! error code, and plain `SQLITE_ERROR` failures are told apart by message.

use crate::config::ConnectOptions;
use crate::db::driver::{Driver, ErrorRef, find_sqlx_database_error, sentinel_kind};
use crate::db::pool::{Database, DbPool, connection_suggestion};
use crate::db::registry::UrlOpener;
use crate::error::{DbError, DbResult};
use crate::models::{Dialect, ErrorKind};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};
use url::Url;

/// Name reported by [`SqliteDriver::driver_name`].
pub const DRIVER_NAME: &str = "sqlx-sqlite";

/// Map a SQLite (extended) result code and message onto the taxonomy.
pub fn sqlite_kind(code: i32, message: &str) -> ErrorKind {
    match code {
        // SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY
        2067 | 1555 => return ErrorKind::UniqueViolation,
        // SQLITE_CONSTRAINT_FOREIGNKEY
        787 => return ErrorKind::ForeignKeyViolation,
        // SQLITE_CONSTRAINT_NOTNULL, SQLITE_CONSTRAINT_CHECK
        1299 | 275 => return ErrorKind::ConstraintViolation,
        // SQLITE_CONSTRAINT_DATATYPE
        3091 => return ErrorKind::DataException,
        _ => {}
    }

    match code & 0xff {
        1 => error_message_kind(message),
        19 => ErrorKind::ConstraintViolation,
        // SQLITE_BUSY, SQLITE_LOCKED
        5 | 6 => ErrorKind::ConcurrentUpdate,
        13 => ErrorKind::OutOfDisk,
        7 => ErrorKind::OutOfMemory,
        23 => ErrorKind::AuthenticationFailed,
        // SQLITE_PERM, SQLITE_READONLY
        3 | 8 => ErrorKind::PermissionDenied,
        // SQLITE_MISMATCH, SQLITE_TOOBIG
        20 | 18 => ErrorKind::DataException,
        // SQLITE_INTERNAL, SQLITE_CORRUPT, SQLITE_NOTADB
        2 | 11 | 26 => ErrorKind::InternalError,
        // SQLITE_INTERRUPT
        9 => ErrorKind::Timeout,
        _ => ErrorKind::Unknown,
    }
}

fn error_message_kind(message: &str) -> ErrorKind {
    if message.starts_with("no such table") {
        ErrorKind::TableNotFound
    } else if message.contains("syntax error")
        || message.contains("no such column")
        || message.contains("unrecognized token")
    {
        ErrorKind::InvalidInputSyntax
    } else {
        ErrorKind::Unknown
    }
}

/// sqlx SQLite adapter.
#[derive(Debug)]
pub struct SqliteDriver {
    pool: Option<DbPool>,
    server_version: Option<String>,
}

impl SqliteDriver {
    /// Adapter without a pool, for classifying errors from a pool managed elsewhere.
    pub fn detached() -> Self {
        Self {
            pool: None,
            server_version: None,
        }
    }

    /// Wrap an existing pool, reading the library version.
    pub async fn from_pool(pool: SqlitePool) -> DbResult<Self> {
        let version = match sqlx::query_scalar::<_, String>("SELECT sqlite_version()")
            .fetch_one(&pool)
            .await
        {
            Ok(version) => version,
            Err(e) => {
                warn!(driver = DRIVER_NAME, error = %e, "Failed to get server version");
                pool.close().await;
                return Err(DbError::version_probe(DRIVER_NAME, e.to_string()));
            }
        };
        debug!(version = %version, "Got server version");

        Ok(Self {
            pool: Some(DbPool::SQLite(pool)),
            server_version: Some(version),
        })
    }

    /// Create a pool for the given options.
    pub async fn connect(options: &ConnectOptions, opener: &SqliteOpener) -> DbResult<Self> {
        let pool_opts = &options.pool;
        let connect_options = SqliteConnectOptions::from_str(options.url.as_str())
            .map_err(|e| {
                DbError::connection(
                    format!("Invalid SQLite connection string: {}", e),
                    "Check the connection URL format: sqlite:path/to/db.sqlite",
                )
            })?
            .create_if_missing(opener.create_if_missing);

        let pool = SqlitePoolOptions::new()
            .min_connections(pool_opts.min_connections_or_default())
            .max_connections(pool_opts.max_connections_or_default(true))
            .acquire_timeout(pool_opts.acquire_timeout_or_default())
            .idle_timeout(Some(pool_opts.idle_timeout_or_default()))
            .test_before_acquire(pool_opts.test_before_acquire_or_default())
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                DbError::connection(
                    format!("Failed to connect: {}", e),
                    connection_suggestion(Dialect::Sqlite, &e),
                )
            })?;

        let driver = Self::from_pool(pool).await?;
        info!(
            driver = DRIVER_NAME,
            version = driver.server_version.as_deref().unwrap_or_default(),
            "Connected successfully"
        );
        Ok(driver)
    }
}

impl Driver for SqliteDriver {
    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    fn classify(&self, err: Option<ErrorRef<'_>>) -> ErrorKind {
        let Some(err) = err else {
            return ErrorKind::NoError;
        };
        if let Some(kind) = sentinel_kind(err) {
            return kind;
        }
        let Some(db_err) = find_sqlx_database_error(err) else {
            return ErrorKind::Unknown;
        };
        db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map_or(ErrorKind::Unknown, |code| {
                sqlite_kind(code, db_err.message())
            })
    }

    fn has_error_details(&self) -> bool {
        false
    }

    fn error_column<'e>(&self, _err: Option<ErrorRef<'e>>) -> &'e str {
        ""
    }

    fn error_table<'e>(&self, _err: Option<ErrorRef<'e>>) -> &'e str {
        ""
    }

    fn error_constraint<'e>(&self, _err: Option<ErrorRef<'e>>) -> &'e str {
        ""
    }

    fn pool(&self) -> Option<&DbPool> {
        self.pool.as_ref()
    }
}

/// Opens `sqlite:` URLs with sqlx.
#[derive(Debug, Clone)]
pub struct SqliteOpener {
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
}

impl Default for SqliteOpener {
    fn default() -> Self {
        Self {
            create_if_missing: true,
        }
    }
}

#[async_trait]
impl UrlOpener for SqliteOpener {
    async fn open_url(&self, url: &Url) -> DbResult<Database> {
        let options = ConnectOptions::from_url(url)?;
        let driver = SqliteDriver::connect(&options, self).await?;
        Ok(Database::new(Box::new(driver))?.with_query_timeout(options.pool.query_timeout()))
    }
}

//! URL scheme registry.
//!
//! Maps the scheme of a connection URL (`postgres`, `mysql`, ...) to the
//! opener that knows how to connect to it. The registry is a plain value:
//! build one at startup, then share it.

use crate::config::masked_url;
use crate::db::mysql::MySqlOpener;
use crate::db::pool::Database;
use crate::db::postgres::PgOpener;
use crate::db::sqlite::SqliteOpener;
use crate::db::tokio_pg::{self, TokioPgOpener};
use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Opens a [`Database`] for URLs of one or more schemes.
#[async_trait]
pub trait UrlOpener: Send + Sync + Debug {
    async fn open_url(&self, url: &Url) -> DbResult<Database>;
}

/// Scheme to opener lookup table.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    openers: HashMap<String, Arc<dyn UrlOpener>>,
}

impl SchemeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every bundled adapter.
    ///
    /// | scheme | adapter |
    /// |---|---|
    /// | `postgres`, `postgresql` | sqlx PostgreSQL |
    /// | `tokio-postgres` | tokio-postgres with deadpool |
    /// | `mysql`, `mariadb` | sqlx MySQL |
    /// | `sqlite` | sqlx SQLite |
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let pg = Arc::new(PgOpener::default());
        let mysql = Arc::new(MySqlOpener::default());
        registry.register_shared("postgres", pg.clone());
        registry.register_shared("postgresql", pg);
        registry.register(tokio_pg::SCHEME, TokioPgOpener::default());
        registry.register_shared("mysql", mysql.clone());
        registry.register_shared("mariadb", mysql);
        registry.register("sqlite", SqliteOpener::default());
        registry
    }

    /// Register `opener` for `scheme`.
    ///
    /// # Panics
    ///
    /// Panics if the scheme is already registered. Use [`try_register`](Self::try_register)
    /// when registrations are not known at build time.
    pub fn register<O: UrlOpener + 'static>(&mut self, scheme: &str, opener: O) {
        self.register_shared(scheme, Arc::new(opener));
    }

    /// Register a shared opener for `scheme`.
    ///
    /// # Panics
    ///
    /// Panics if the scheme is already registered.
    pub fn register_shared(&mut self, scheme: &str, opener: Arc<dyn UrlOpener>) {
        if let Err(e) = self.try_register_shared(scheme, opener) {
            panic!("{e}");
        }
    }

    /// Register `opener` for `scheme`, failing if the scheme is taken.
    pub fn try_register<O: UrlOpener + 'static>(&mut self, scheme: &str, opener: O) -> DbResult<()> {
        self.try_register_shared(scheme, Arc::new(opener))
    }

    fn try_register_shared(&mut self, scheme: &str, opener: Arc<dyn UrlOpener>) -> DbResult<()> {
        let scheme = scheme.to_ascii_lowercase();
        if self.openers.contains_key(&scheme) {
            return Err(DbError::duplicate_scheme(scheme));
        }
        debug!(scheme = %scheme, "Registered URL opener");
        self.openers.insert(scheme, opener);
        Ok(())
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.openers.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Whether an opener is registered for `scheme`.
    pub fn is_registered(&self, scheme: &str) -> bool {
        self.openers.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Parse `url` and open it with the opener registered for its scheme.
    pub async fn open(&self, url: &str) -> DbResult<Database> {
        let parsed = Url::parse(url)
            .map_err(|e| DbError::invalid_url(format!("failed to parse URL: {}", e)))?;
        self.open_url(&parsed).await
    }

    /// Open an already parsed URL with the opener registered for its scheme.
    pub async fn open_url(&self, url: &Url) -> DbResult<Database> {
        let scheme = url.scheme().to_ascii_lowercase();
        let opener = self
            .openers
            .get(&scheme)
            .ok_or_else(|| DbError::unknown_scheme(&scheme, &self.schemes()))?;

        info!(scheme = %scheme, url = %masked_url(url), "Opening database");
        opener.open_url(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Opener that records the URLs it receives and never connects.
    #[derive(Debug, Default)]
    struct RecordingOpener {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UrlOpener for RecordingOpener {
        async fn open_url(&self, url: &Url) -> DbResult<Database> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DbError::connection(
                format!("refusing {}", url.scheme()),
                "test opener",
            ))
        }
    }

    #[test]
    fn test_builtin_schemes() {
        let registry = SchemeRegistry::with_builtin();
        assert_eq!(
            registry.schemes(),
            vec![
                "mariadb",
                "mysql",
                "postgres",
                "postgresql",
                "sqlite",
                "tokio-postgres"
            ]
        );
        assert!(registry.is_registered("postgres"));
        assert!(registry.is_registered("MySQL"));
        assert!(!registry.is_registered("oracle"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = SchemeRegistry::new();
        assert!(registry.schemes().is_empty());
        assert!(!registry.is_registered("postgres"));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_register_duplicate_panics() {
        let mut registry = SchemeRegistry::new();
        registry.register("custom", RecordingOpener::default());
        registry.register("CUSTOM", RecordingOpener::default());
    }

    #[test]
    fn test_try_register_duplicate() {
        let mut registry = SchemeRegistry::with_builtin();
        let err = registry
            .try_register("postgres", RecordingOpener::default())
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateScheme { ref scheme } if scheme == "postgres"));
        assert!(registry.try_register("custom", RecordingOpener::default()).is_ok());
        assert!(registry.is_registered("custom"));
    }

    #[tokio::test]
    async fn test_open_unknown_scheme() {
        let registry = SchemeRegistry::with_builtin();
        let err = registry.open("oracle://scott:tiger@db/orcl").await.unwrap_err();
        match err {
            DbError::UnknownScheme { scheme, registered } => {
                assert_eq!(scheme, "oracle");
                assert!(registered.contains("postgres"));
                assert!(registered.contains("sqlite"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_open_on_empty_registry() {
        let err = SchemeRegistry::new().open("mysql://localhost/db").await.unwrap_err();
        assert!(err.to_string().contains("registered: none"));
    }

    #[tokio::test]
    async fn test_open_invalid_url() {
        let registry = SchemeRegistry::with_builtin();
        let err = registry.open("not a url").await.unwrap_err();
        assert!(matches!(err, DbError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_open_delegates_by_scheme() {
        let opener = Arc::new(RecordingOpener::default());
        let mut registry = SchemeRegistry::new();
        registry.register_shared("custom", opener.clone());

        let err = registry.open("CUSTOM://host/db").await.unwrap_err();
        assert!(err.to_string().contains("refusing custom"));
        assert_eq!(opener.calls.load(Ordering::SeqCst), 1);
    }
}

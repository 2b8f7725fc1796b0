//! Integration tests for transactions and pool passthroughs on SQLite.

use std::path::Path;
use tempfile::TempDir;
use unisql::{Database, DbError, DriverError, ErrorKind, SchemeRegistry, Sentinel};

/// Open a file-backed database with one table.
async fn setup_db(dir: &Path) -> Database {
    let url = format!("sqlite://{}", dir.join("app.db").display());
    let db = SchemeRegistry::with_builtin().open(&url).await.unwrap();
    db.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL)", &[])
        .await
        .unwrap();
    db
}

async fn count(db: &Database) -> String {
    db.fetch_string("SELECT CAST(COUNT(*) AS TEXT) FROM items", &[])
        .await
        .unwrap()
}

#[tokio::test]
async fn test_commit_persists() {
    let dir = TempDir::new().unwrap();
    let db = setup_db(dir.path()).await;

    let mut tx = db.begin().await.unwrap();
    assert_eq!(
        tx.execute("INSERT INTO items (id, name) VALUES (1, 'one')", &[])
            .await
            .unwrap(),
        1
    );
    tx.commit().await.unwrap();
    assert!(tx.is_finished());

    assert_eq!(count(&db).await, "1");
}

#[tokio::test]
async fn test_rollback_discards() {
    let dir = TempDir::new().unwrap();
    let db = setup_db(dir.path()).await;

    let mut tx = db.begin().await.unwrap();
    tx.execute("INSERT INTO items (id, name) VALUES (1, 'one')", &[])
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(count(&db).await, "0");
}

#[tokio::test]
async fn test_finished_transaction_reports_tx_done() {
    let dir = TempDir::new().unwrap();
    let db = setup_db(dir.path()).await;

    let mut tx = db.begin().await.unwrap();
    tx.commit().await.unwrap();

    let err = tx
        .execute("INSERT INTO items (id, name) VALUES (1, 'one')", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Sentinel(Sentinel::TxDone)));
    assert_eq!(db.classify(Some(&err)), ErrorKind::TxDone);

    let err = tx.commit().await.unwrap_err();
    assert_eq!(db.classify(Some(&err)), ErrorKind::TxDone);
    let err = tx.rollback().await.unwrap_err();
    assert_eq!(db.classify(Some(&err)), ErrorKind::TxDone);
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let dir = TempDir::new().unwrap();
    let db = setup_db(dir.path()).await;

    {
        let mut tx = db.begin().await.unwrap();
        tx.execute("INSERT INTO items (id, name) VALUES (1, 'one')", &[])
            .await
            .unwrap();
    }

    assert_eq!(count(&db).await, "0");
}

#[tokio::test]
async fn test_run_in_transaction_commits() {
    let dir = TempDir::new().unwrap();
    let db = setup_db(dir.path()).await;

    let rows = db
        .run_in_transaction(|tx| {
            Box::pin(async move {
                let a = tx.execute("INSERT INTO items (id, name) VALUES (1, 'one')", &[]).await?;
                let b = tx.execute("INSERT INTO items (id, name) VALUES (2, 'two')", &[]).await?;
                Ok::<_, DriverError>(a + b)
            })
        })
        .await
        .unwrap();

    assert_eq!(rows, 2);
    assert_eq!(count(&db).await, "2");
}

#[tokio::test]
async fn test_run_in_transaction_rolls_back_on_error() {
    let dir = TempDir::new().unwrap();
    let db = setup_db(dir.path()).await;

    let err = db
        .run_in_transaction(|tx| {
            Box::pin(async move {
                let insert = "INSERT INTO items (id, name) VALUES (?, ?)";
                tx.execute(insert, &[1.into(), "one".into()]).await?;
                tx.execute(insert, &[1.into(), "again".into()]).await?;
                Ok::<_, DriverError>(())
            })
        })
        .await
        .unwrap_err();

    assert_eq!(db.classify(Some(&err)), ErrorKind::UniqueViolation);
    assert_eq!(count(&db).await, "0");
}

#[tokio::test]
async fn test_pool_options_from_url() {
    let dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?max_connections=2&query_timeout=5",
        dir.path().join("opts.db").display()
    );
    let db = SchemeRegistry::with_builtin().open(&url).await.unwrap();

    assert_eq!(db.status().max_size, 2);
    assert_eq!(db.query_timeout(), Some(std::time::Duration::from_secs(5)));
    db.ping().await.unwrap();
}

#[tokio::test]
async fn test_invalid_pool_options_rejected() {
    let err = SchemeRegistry::with_builtin()
        .open("sqlite::memory:?max_connections=0")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_resize_unsupported_for_sqlx() {
    let db = SchemeRegistry::with_builtin()
        .open("sqlite::memory:")
        .await
        .unwrap();
    let err = db.resize(4).unwrap_err();
    assert!(matches!(err, DbError::Unsupported { .. }));
}

#[tokio::test]
async fn test_close() {
    let db = SchemeRegistry::with_builtin()
        .open("sqlite::memory:")
        .await
        .unwrap();
    assert!(!db.is_closed());
    db.ping().await.unwrap();

    db.close().await;
    assert!(db.is_closed());

    let err = db.execute("SELECT 1", &[]).await.unwrap_err();
    assert_eq!(db.classify(Some(&err)), ErrorKind::Unknown);
}

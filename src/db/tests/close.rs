use crate::db::*;
use crate::types::ThreadIdentity;
use tempfile::NamedTempFile;

/// Verify that querying the database after closing the pool returns an error
/// rather than hanging or panicking.
#[tokio::test]
async fn test_load_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool.close().await;

    let result = db.load_draft(&ThreadIdentity::new_thread(1)).await;
    assert!(result.is_err(), "closed pool should surface a database error");
}

#[tokio::test]
async fn test_save_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool.close().await;

    let draft = crate::types::Draft::new("hello", "test", None);
    let result = db.save_draft(&ThreadIdentity::new_thread(1), &draft).await;
    assert!(matches!(result, Err(crate::Error::Database(_))));
}

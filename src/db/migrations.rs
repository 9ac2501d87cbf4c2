//! Opening the draft database and bringing its schema up to date.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use std::path::Path;

use super::Database;

/// Schema steps in order; entry `n` moves the database to version `n + 1`
const SCHEMA: &[&[&str]] = &[&[
    "CREATE TABLE drafts (
        target_kind TEXT NOT NULL,
        target_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        subject TEXT NOT NULL DEFAULT '',
        icon_id TEXT,
        icon_url TEXT,
        saved_at INTEGER NOT NULL,
        PRIMARY KEY (target_kind, target_id)
    )",
    "CREATE INDEX idx_drafts_saved_at ON drafts(saved_at)",
]];

fn connection_failed(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Database(DatabaseError::ConnectionFailed(format!("{}: {}", context, e)))
}

fn migration_failed(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Database(DatabaseError::MigrationFailed(format!("{}: {}", context, e)))
}

impl Database {
    /// Open (or create) the draft database at `path`
    ///
    /// Missing parent directories are created and pending schema steps are
    /// applied before the handle is returned.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "cannot create database directory {}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(connection_failed("cannot open draft database"))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply every schema step newer than the recorded version in one transaction
    async fn migrate(&self) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(connection_failed("cannot start migration"))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
        )
        .execute(&mut *tx)
        .await
        .map_err(migration_failed("cannot create schema_version"))?;

        let current: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&mut *tx)
            .await
            .map_err(migration_failed("cannot read schema version"))?;

        let applied = usize::try_from(current).unwrap_or(0);
        for (version, statements) in (1_i64..).zip(SCHEMA).skip(applied) {
            tracing::info!(version, "Applying draft schema migration");
            for statement in *statements {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(migration_failed("schema step failed"))?;
            }
            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
                .bind(version)
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *tx)
                .await
                .map_err(migration_failed("cannot record schema version"))?;
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit()
            .await
            .map_err(migration_failed("cannot commit migration"))
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

//! Database layer for forum-composer
//!
//! Handles SQLite persistence of drafts, one row per [`ThreadIdentity`].
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`drafts`] - Draft CRUD and the [`DraftStore`] implementation

use crate::Result;
use crate::types::{Draft, ThreadIdentity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod drafts;
mod migrations;

/// Persistence boundary for drafts
///
/// Every read goes through the store so drafts survive process restarts; the
/// pipeline keeps at most the single draft it loaded at startup.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Most recent saved draft for `id`, if any
    async fn load_draft(&self, id: &ThreadIdentity) -> Result<Option<Draft>>;

    /// Replace or insert the draft for `id`
    ///
    /// Implementations refuse drafts whose trimmed content is empty.
    async fn save_draft(&self, id: &ThreadIdentity, draft: &Draft) -> Result<()>;

    /// Remove any draft for `id`; succeeds when there is none
    async fn delete_draft(&self, id: &ThreadIdentity) -> Result<()>;
}

/// Draft record from database
#[derive(Debug, Clone, FromRow)]
pub struct DraftRow {
    /// Identity variant ("new_thread", "reply", "edit_post")
    pub target_kind: String,
    /// Forum, thread or post id
    pub target_id: i64,
    /// Post body
    pub content: String,
    /// Thread subject
    pub subject: String,
    /// Selected icon id
    pub icon_id: Option<String>,
    /// Selected icon URL
    pub icon_url: Option<String>,
    /// Unix timestamp in milliseconds when the draft was saved
    pub saved_at: i64,
}

impl DraftRow {
    /// The identity this row is keyed by, `None` for an unknown kind
    pub fn identity(&self) -> Option<ThreadIdentity> {
        ThreadIdentity::from_parts(&self.target_kind, self.target_id)
    }
}

impl From<DraftRow> for Draft {
    fn from(row: DraftRow) -> Self {
        Draft {
            content: row.content,
            subject: row.subject,
            icon_id: row.icon_id,
            icon_url: row.icon_url,
            timestamp: DateTime::<Utc>::from_timestamp_millis(row.saved_at)
                .unwrap_or_else(Utc::now),
        }
    }
}

/// Database handle for forum-composer
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

//! Draft CRUD operations.

use crate::error::{DatabaseError, ValidationError};
use crate::types::{Draft, ThreadIdentity};
use crate::{Error, Result};
use async_trait::async_trait;

use super::{Database, DraftRow, DraftStore};

impl Database {
    /// Get the draft stored for an identity
    pub async fn get_draft(&self, id: &ThreadIdentity) -> Result<Option<Draft>> {
        let row = sqlx::query_as::<_, DraftRow>(
            r#"
            SELECT target_kind, target_id, content, subject, icon_id, icon_url, saved_at
            FROM drafts
            WHERE target_kind = ? AND target_id = ?
            "#,
        )
        .bind(id.kind())
        .bind(id.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get draft: {}",
                e
            )))
        })?;

        Ok(row.map(Draft::from))
    }

    /// Update the draft for an identity, returning the number of rows affected
    pub async fn update_draft(&self, id: &ThreadIdentity, draft: &Draft) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE drafts
            SET content = ?, subject = ?, icon_id = ?, icon_url = ?, saved_at = ?
            WHERE target_kind = ? AND target_id = ?
            "#,
        )
        .bind(&draft.content)
        .bind(&draft.subject)
        .bind(&draft.icon_id)
        .bind(&draft.icon_url)
        .bind(draft.timestamp.timestamp_millis())
        .bind(id.kind())
        .bind(id.id())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update draft: {}",
                e
            )))
        })?;

        Ok(result.rows_affected())
    }

    /// Insert a new draft row for an identity
    pub async fn insert_draft(&self, id: &ThreadIdentity, draft: &Draft) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO drafts (
                target_kind, target_id, content, subject, icon_id, icon_url, saved_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.kind())
        .bind(id.id())
        .bind(&draft.content)
        .bind(&draft.subject)
        .bind(&draft.icon_id)
        .bind(&draft.icon_url)
        .bind(draft.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert draft: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Delete the draft for an identity, returning the number of rows removed
    pub async fn remove_draft(&self, id: &ThreadIdentity) -> Result<u64> {
        let result = sqlx::query("DELETE FROM drafts WHERE target_kind = ? AND target_id = ?")
            .bind(id.kind())
            .bind(id.id())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete draft: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }

    /// List all stored drafts, newest first
    ///
    /// Rows with an unrecognised identity kind are skipped.
    pub async fn list_drafts(&self) -> Result<Vec<(ThreadIdentity, Draft)>> {
        let rows = sqlx::query_as::<_, DraftRow>(
            r#"
            SELECT target_kind, target_id, content, subject, icon_id, icon_url, saved_at
            FROM drafts
            ORDER BY saved_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list drafts: {}",
                e
            )))
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.identity() {
                Some(identity) => Some((identity, Draft::from(row))),
                None => {
                    tracing::warn!(kind = %row.target_kind, id = row.target_id, "Skipping draft with unknown kind");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl DraftStore for Database {
    async fn load_draft(&self, id: &ThreadIdentity) -> Result<Option<Draft>> {
        self.get_draft(id).await
    }

    async fn save_draft(&self, id: &ThreadIdentity, draft: &Draft) -> Result<()> {
        if !draft.has_content() {
            return Err(Error::Validation(ValidationError::EmptyDraft));
        }

        if self.update_draft(id, draft).await? == 0 {
            self.insert_draft(id, draft).await?;
            tracing::debug!(identity = %id, "Inserted new draft");
        } else {
            tracing::debug!(identity = %id, "Replaced existing draft");
        }

        Ok(())
    }

    async fn delete_draft(&self, id: &ThreadIdentity) -> Result<()> {
        let removed = self.remove_draft(id).await?;
        tracing::debug!(identity = %id, removed, "Deleted draft");
        Ok(())
    }
}

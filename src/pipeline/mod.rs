//! Submission pipeline split into focused submodules.
//!
//! The `SubmissionPipeline` struct and its methods are organized by domain:
//! - [`lifecycle`] - Form load, draft offer, leaving and teardown
//! - [`compose`] - Editing the post and its attachment
//! - [`submit`] - Preview and submit attempts
//!
//! One pipeline drives one composition session for one [`ThreadIdentity`]:
//!
//! ```text
//! Loading -> Ready -> (Previewing | Submitting) -> Posted | Cancelled
//! ```
//!
//! `Ready` is re-entered after a failed preview or submit. Every
//! state-changing method takes `&mut self`, so at most one request is ever
//! outstanding.

mod compose;
mod lifecycle;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::attachment::AttachmentValidator;
use crate::config::{Config, PipelineConfig};
use crate::db::DraftStore;
use crate::duration;
use crate::error::{Error, Result, TransportError, ValidationError};
use crate::transport::Transport;
use crate::types::{Draft, Event, FormTokens, PipelineState, PostIcon, PostOptions, ThreadIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Result of [`SubmissionPipeline::load`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Form loaded, no stored draft; the pipeline is `Ready`
    Ready,
    /// A stored draft exists; answer with `use_draft()` or `discard_draft()`
    DraftAvailable(DraftOffer),
}

/// Summary of a stored draft for the use/discard prompt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOffer {
    /// Saved subject
    pub subject: String,
    /// Start of the saved body, with "..." appended when cut
    pub preview: String,
    /// When the draft was saved
    pub saved_at: DateTime<Utc>,
    /// Compact age, e.g. "2h 5m 10s"
    pub saved_ago: String,
}

impl DraftOffer {
    /// Summarize `draft`, keeping at most `preview_chars` characters of content
    pub fn new(draft: &Draft, preview_chars: usize, now: DateTime<Utc>) -> Self {
        let preview = if draft.content.chars().count() > preview_chars {
            let mut cut: String = draft.content.chars().take(preview_chars).collect();
            cut.push_str("...");
            cut
        } else {
            draft.content.clone()
        };

        Self {
            subject: draft.subject.clone(),
            preview,
            saved_at: draft.timestamp,
            saved_ago: duration::format_since(draft.timestamp, now),
        }
    }
}

/// Result of [`SubmissionPipeline::submit`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The forum accepted the post; the pipeline is `Posted`
    Posted,
    /// The attempt failed; the pipeline is back in `Ready`
    Failed {
        /// Message to show the user
        message: String,
        /// Whether the content was persisted as a draft
        draft_saved: bool,
    },
}

/// Result of [`SubmissionPipeline::preview`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Rendered post HTML
    Rendered(String),
    /// The render failed; call `preview()` again to retry
    Failed {
        /// Message to show the user
        message: String,
    },
}

/// What to do with the content when the user navigates away
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveChoice {
    /// Keep the content as a draft
    Save,
    /// Throw the content away, along with any stored draft
    Discard,
}

/// The user's in-progress post
#[derive(Clone, Debug, Default)]
pub(crate) struct Composition {
    pub(crate) subject: String,
    pub(crate) body: String,
    pub(crate) icon: Option<PostIcon>,
    pub(crate) attachment: Option<PathBuf>,
    pub(crate) options: PostOptions,
}

impl Composition {
    fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    fn to_draft(&self) -> Draft {
        Draft::new(self.body.clone(), self.subject.clone(), self.icon.as_ref())
    }
}

/// State machine for composing and submitting one post
pub struct SubmissionPipeline {
    /// What this session posts to (immutable)
    pub(crate) target: ThreadIdentity,
    /// Forum requests
    pub(crate) transport: Arc<dyn Transport>,
    /// Draft persistence
    pub(crate) drafts: Arc<dyn DraftStore>,
    /// Attachment checks
    pub(crate) validator: AttachmentValidator,
    /// Session behaviour
    pub(crate) config: PipelineConfig,
    /// Current state
    pub(crate) state: PipelineState,
    /// Tokens from the latest form load; `None` once an attempt used them
    pub(crate) tokens: Option<FormTokens>,
    /// Draft found at load, waiting for use/discard
    pub(crate) pending_draft: Option<Draft>,
    /// The post being edited
    pub(crate) composition: Composition,
    /// Whether leaving the session should persist the content
    pub(crate) save_required: bool,
    /// Aborts outstanding requests
    pub(crate) cancel: CancellationToken,
    /// Broadcast channel for presentation-layer events
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl SubmissionPipeline {
    /// Create a pipeline for `target` in the `Loading` state
    ///
    /// Nothing is fetched until [`load`](Self::load) is called.
    pub fn new(
        target: ThreadIdentity,
        transport: Arc<dyn Transport>,
        drafts: Arc<dyn DraftStore>,
        config: &Config,
    ) -> Result<Self> {
        if !target.is_valid() {
            return Err(Error::Validation(ValidationError::InvalidTarget {
                id: target.id(),
            }));
        }

        let (event_tx, _rx) = broadcast::channel(config.pipeline.event_capacity.max(1));

        Ok(Self {
            target,
            transport,
            drafts,
            validator: AttachmentValidator::new(config.attachment.clone()),
            config: config.pipeline.clone(),
            state: PipelineState::Loading,
            tokens: None,
            pending_draft: None,
            composition: Composition::default(),
            save_required: true,
            cancel: CancellationToken::new(),
            event_tx,
        })
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported; events emitted before a
    /// subscription are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Token the host can cancel to abort the outstanding request
    ///
    /// Cancellation is permanent: every later request fails with
    /// [`Error::Cancelled`], so the only useful follow-up is
    /// [`teardown`](Self::teardown).
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// What this session posts to
    pub fn target(&self) -> ThreadIdentity {
        self.target
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Tokens from the latest form load, if still unused
    pub fn tokens(&self) -> Option<&FormTokens> {
        self.tokens.as_ref()
    }

    /// Current subject
    pub fn subject(&self) -> &str {
        &self.composition.subject
    }

    /// Current body
    pub fn body(&self) -> &str {
        &self.composition.body
    }

    /// Selected icon
    pub fn icon(&self) -> Option<&PostIcon> {
        self.composition.icon.as_ref()
    }

    /// Accepted attachment
    pub fn attachment(&self) -> Option<&Path> {
        self.composition.attachment.as_deref()
    }

    /// Current posting options
    pub fn options(&self) -> PostOptions {
        self.composition.options
    }

    /// Whether leaving the session would persist the content
    pub fn save_required(&self) -> bool {
        self.save_required
    }

    /// Whether a stored draft is waiting for `use_draft()` / `discard_draft()`
    pub fn has_pending_draft(&self) -> bool {
        self.pending_draft.is_some()
    }

    /// Emit an event to all subscribers
    ///
    /// If nobody is subscribed the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Move to `to`, announcing the change
    pub(crate) fn transition(&mut self, to: PipelineState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(identity = %self.target, %from, %to, "Pipeline state changed");
        self.emit_event(Event::StateChanged {
            target: self.target,
            from,
            to,
        });
    }

    /// Return to `Ready` if a submit or preview future was dropped mid-request
    ///
    /// Every state-changing method holds `&mut self` until it finishes, so an
    /// in-flight state seen here belongs to a future that no longer exists.
    pub(crate) fn settle_abandoned(&mut self) {
        if matches!(
            self.state,
            PipelineState::Submitting | PipelineState::Previewing
        ) {
            tracing::warn!(
                identity = %self.target,
                state = %self.state,
                "Request dropped before completing, back to ready"
            );
            self.transition(PipelineState::Ready);
        }
    }

    /// Fail with `InvalidState` unless the pipeline is in `expected`
    pub(crate) fn require_state(&mut self, operation: &str, expected: PipelineState) -> Result<()> {
        self.settle_abandoned();
        if self.state != expected {
            return Err(self.invalid_state(operation));
        }
        Ok(())
    }

    pub(crate) fn invalid_state(&self, operation: &str) -> Error {
        let state = if self.pending_draft.is_some() {
            format!("{} (draft offer pending)", self.state)
        } else {
            self.state.to_string()
        };
        Error::InvalidState {
            operation: operation.to_string(),
            state,
        }
    }

    /// Race a transport call against cancellation
    pub(crate) async fn cancellable<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, TransportError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = request => result.map_err(Error::from),
        }
    }

    /// Persist the current content as a draft, reporting whether it worked
    ///
    /// Failures are logged; callers decide what the user is told.
    pub(crate) async fn save_current(&self) -> bool {
        let draft = self.composition.to_draft();
        match self.drafts.save_draft(&self.target, &draft).await {
            Ok(()) => {
                tracing::info!(identity = %self.target, "Saved draft");
                self.emit_event(Event::DraftSaved {
                    target: self.target,
                });
                true
            }
            Err(e) => {
                tracing::error!(identity = %self.target, error = %e, "Failed to save draft");
                false
            }
        }
    }

    /// Remove any stored draft for this target
    pub(crate) async fn delete_stored(&self) -> Result<()> {
        self.drafts.delete_draft(&self.target).await?;
        self.emit_event(Event::DraftDeleted {
            target: self.target,
        });
        Ok(())
    }
}

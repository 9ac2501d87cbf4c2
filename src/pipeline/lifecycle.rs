//! Session lifecycle: form load, draft offer, leaving and teardown.

use crate::error::{Error, Result};
use crate::scrape;
use crate::types::{Event, PipelineState, PostOptions};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{DraftOffer, LeaveChoice, LoadOutcome, SubmissionPipeline};

impl SubmissionPipeline {
    /// Fetch the posting form and look for a stored draft
    ///
    /// Both requests run concurrently and the pipeline is not ready until
    /// both have finished. If a draft with content exists the pipeline stays
    /// in `Loading` and returns [`LoadOutcome::DraftAvailable`]; the caller
    /// answers with [`use_draft`](Self::use_draft) or
    /// [`discard_draft`](Self::discard_draft).
    ///
    /// # Errors
    ///
    /// A transport or parse failure emits [`Event::LoadFailed`], waits
    /// `load_failure_delay` so the message can be shown, moves to
    /// `Cancelled` and returns the failure. A draft read failure is logged
    /// and treated as "no draft".
    pub async fn load(&mut self) -> Result<LoadOutcome> {
        self.require_state("load", PipelineState::Loading)?;
        if self.pending_draft.is_some() {
            return Err(self.invalid_state("load"));
        }

        let transport = Arc::clone(&self.transport);
        let drafts = Arc::clone(&self.drafts);
        let target = self.target;

        debug!(identity = %target, "Loading posting form");

        let joined = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            joined = async {
                tokio::join!(transport.fetch_form(&target), drafts.load_draft(&target))
            } => Some(joined),
        };

        let Some((form, stored)) = joined else {
            info!(identity = %target, "Form load cancelled");
            self.transition(PipelineState::Cancelled);
            return Err(Error::Cancelled);
        };

        let tokens = match form
            .map_err(Error::from)
            .and_then(|html| scrape::parse_form(&html).map_err(Error::from))
        {
            Ok(tokens) => tokens,
            Err(e) => return Err(self.fail_load(e).await),
        };

        self.composition.options = PostOptions::from(&tokens);
        self.tokens = Some(tokens);

        let draft = match stored {
            Ok(Some(draft)) if draft.has_content() => Some(draft),
            Ok(Some(_)) => {
                debug!(identity = %target, "Ignoring stored draft without content");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(identity = %target, error = %e, "Failed to read draft, continuing without one");
                None
            }
        };

        match draft {
            Some(draft) => {
                let offer = DraftOffer::new(&draft, self.config.draft_preview_chars, Utc::now());
                info!(identity = %target, saved_ago = %offer.saved_ago, "Found stored draft");
                self.emit_event(Event::DraftFound {
                    target,
                    saved_ago: offer.saved_ago.clone(),
                });
                self.pending_draft = Some(draft);
                Ok(LoadOutcome::DraftAvailable(offer))
            }
            None => {
                self.transition(PipelineState::Ready);
                Ok(LoadOutcome::Ready)
            }
        }
    }

    async fn fail_load(&mut self, e: Error) -> Error {
        error!(identity = %self.target, error = %e, "Failed to load posting form");
        self.emit_event(Event::LoadFailed {
            target: self.target,
            error: e.to_string(),
        });

        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.load_failure_delay) => {}
        }

        self.transition(PipelineState::Cancelled);
        e
    }

    /// Restore the offered draft's content, subject and icon
    pub fn use_draft(&mut self) -> Result<()> {
        self.require_state("use_draft", PipelineState::Loading)?;
        let draft = self
            .pending_draft
            .take()
            .ok_or_else(|| self.invalid_state("use_draft"))?;

        self.composition.icon = draft.icon();
        self.composition.subject = draft.subject;
        self.composition.body = draft.content;

        self.transition(PipelineState::Ready);
        Ok(())
    }

    /// Delete the offered draft and start from an empty post
    ///
    /// A failed delete is logged; the stale draft will simply be offered
    /// again next session.
    pub async fn discard_draft(&mut self) -> Result<()> {
        self.require_state("discard_draft", PipelineState::Loading)?;
        if self.pending_draft.take().is_none() {
            return Err(self.invalid_state("discard_draft"));
        }

        if let Err(e) = self.delete_stored().await {
            warn!(identity = %self.target, error = %e, "Failed to delete discarded draft");
        }

        self.transition(PipelineState::Ready);
        Ok(())
    }

    /// Navigate away from the session
    ///
    /// An empty body cancels and removes any stored draft, whatever the
    /// choice. Otherwise [`LeaveChoice::Save`] persists the content before
    /// cancelling and [`LeaveChoice::Discard`] deletes the stored draft.
    /// Leaving while a draft offer is undecided, or before the form loaded,
    /// does not touch the store.
    ///
    /// # Errors
    ///
    /// If saving fails the pipeline stays in `Ready` so the content is not
    /// lost.
    pub async fn leave(&mut self, choice: LeaveChoice) -> Result<()> {
        self.settle_abandoned();
        match self.state {
            PipelineState::Loading => {
                debug!(identity = %self.target, "Leaving before the session was ready");
                self.transition(PipelineState::Cancelled);
                return Ok(());
            }
            PipelineState::Ready => {}
            _ => return Err(self.invalid_state("leave")),
        }

        if !self.composition.has_body() {
            self.delete_stored().await?;
            self.save_required = false;
        } else {
            match choice {
                LeaveChoice::Save => {
                    let draft = self.composition.to_draft();
                    self.drafts.save_draft(&self.target, &draft).await?;
                    info!(identity = %self.target, "Saved draft on leave");
                    self.emit_event(Event::DraftSaved {
                        target: self.target,
                    });
                }
                LeaveChoice::Discard => {
                    self.delete_stored().await?;
                    self.save_required = false;
                }
            }
        }

        self.transition(PipelineState::Cancelled);
        Ok(())
    }

    /// The host's pause hook
    ///
    /// When save-required is set in `Ready`, an empty body deletes the stored
    /// draft and anything else is saved. Does nothing in any other state,
    /// including while a draft offer is undecided.
    pub async fn auto_save(&mut self) -> Result<()> {
        self.settle_abandoned();
        if self.state != PipelineState::Ready || !self.save_required {
            return Ok(());
        }

        if self.composition.has_body() {
            let draft = self.composition.to_draft();
            self.drafts.save_draft(&self.target, &draft).await?;
            debug!(identity = %self.target, "Auto-saved draft");
            self.emit_event(Event::DraftSaved {
                target: self.target,
            });
        } else {
            self.delete_stored().await?;
        }

        Ok(())
    }

    /// Cancel any outstanding request and run a final auto-save
    ///
    /// The save does not depend on an in-flight response.
    pub async fn teardown(mut self) -> Result<()> {
        self.cancel.cancel();
        self.auto_save().await
    }
}

//! Preview and submit attempts.

use crate::error::{Error, Result, ValidationError};
use crate::scrape;
use crate::types::{ComposedPost, Event, FormTokens, PipelineState};
use tracing::{debug, error, info, warn};

use super::{PreviewOutcome, SubmissionPipeline, SubmitOutcome};

impl SubmissionPipeline {
    /// Submit the post
    ///
    /// On success the stored draft is purged and the pipeline ends in
    /// `Posted`. On failure the content is saved as a draft before control
    /// returns, and the pipeline goes back to `Ready` for a retry. There is
    /// no automatic retry.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyBody`] for a blank body; nothing is sent
    /// - [`Error::Cancelled`] if the host cancelled the request; the
    ///   pipeline is back in `Ready` with save-required intact
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        self.require_state("submit", PipelineState::Ready)?;
        if !self.composition.has_body() {
            return Err(Error::Validation(ValidationError::EmptyBody));
        }

        self.transition(PipelineState::Submitting);

        let result = match self.prepare_post().await {
            Ok(post) => {
                info!(identity = %self.target, "Submitting post");
                self.cancellable(self.transport.submit(&post)).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                // the post is live; a leftover draft is only clutter
                if let Err(e) = self.delete_stored().await {
                    warn!(identity = %self.target, error = %e, "Failed to purge draft after posting");
                }
                self.save_required = false;
                info!(identity = %self.target, "Post accepted");
                self.emit_event(Event::Posted {
                    target: self.target,
                });
                self.transition(PipelineState::Posted);
                Ok(SubmitOutcome::Posted)
            }
            Err(Error::Cancelled) => {
                self.transition(PipelineState::Ready);
                Err(Error::Cancelled)
            }
            Err(e) => {
                error!(identity = %self.target, error = %e, "Submission failed");
                let draft_saved = self.save_current().await;
                let message = e.to_string();
                self.emit_event(Event::SubmitFailed {
                    target: self.target,
                    error: message.clone(),
                    draft_saved,
                });
                self.transition(PipelineState::Ready);
                Ok(SubmitOutcome::Failed {
                    message,
                    draft_saved,
                })
            }
        }
    }

    /// Ask the forum to render the post
    ///
    /// Always returns to `Ready`. A failure is reported as
    /// [`PreviewOutcome::Failed`]; retry by calling `preview()` again.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyBody`] for a blank body; nothing is sent
    /// - [`Error::Cancelled`] if the host cancelled the request
    pub async fn preview(&mut self) -> Result<PreviewOutcome> {
        self.require_state("preview", PipelineState::Ready)?;
        if !self.composition.has_body() {
            return Err(Error::Validation(ValidationError::EmptyBody));
        }

        self.transition(PipelineState::Previewing);

        let result = match self.prepare_post().await {
            Ok(post) => self.cancellable(self.transport.preview(&post)).await,
            Err(e) => Err(e),
        };

        self.transition(PipelineState::Ready);

        match result {
            Ok(html) => Ok(PreviewOutcome::Rendered(html)),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!(identity = %self.target, error = %e, "Preview failed");
                let message = e.to_string();
                self.emit_event(Event::PreviewFailed {
                    target: self.target,
                    error: message.clone(),
                });
                Ok(PreviewOutcome::Failed { message })
            }
        }
    }

    /// Tokens for the next attempt, consuming the current set
    ///
    /// Every attempt posts the form and so spends its tokens; once spent,
    /// the form is fetched again. User-chosen options are left alone.
    async fn ensure_tokens(&mut self) -> Result<FormTokens> {
        if let Some(tokens) = self.tokens.take() {
            return Ok(tokens);
        }

        debug!(identity = %self.target, "Form tokens spent, fetching a fresh form");
        let html = self.cancellable(self.transport.fetch_form(&self.target)).await?;
        Ok(scrape::parse_form(&html)?)
    }

    async fn prepare_post(&mut self) -> Result<ComposedPost> {
        let tokens = self.ensure_tokens().await?;
        Ok(self.compose_post(tokens))
    }

    /// Build the outbound payload from the current composition
    pub(crate) fn compose_post(&self, tokens: FormTokens) -> ComposedPost {
        ComposedPost {
            target: self.target,
            form_key: tokens.form_key,
            form_cookie: tokens.form_cookie,
            subject: self.composition.subject.clone(),
            body: self.composition.body.clone(),
            icon: self.composition.icon.clone(),
            attachment: self.composition.attachment.clone(),
            options: self.composition.options,
        }
    }
}

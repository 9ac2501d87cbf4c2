//! Editing the post: text, icon, options and attachment.

use crate::attachment::{AttachmentOutcome, FileResolver};
use crate::error::{Error, Result, ValidationError};
use crate::types::{Event, PipelineState, PostIcon};
use std::path::PathBuf;

use super::SubmissionPipeline;

impl SubmissionPipeline {
    /// Replace the subject
    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<()> {
        self.require_state("edit", PipelineState::Ready)?;
        self.composition.subject = subject.into();
        self.save_required = true;
        Ok(())
    }

    /// Replace the body
    pub fn set_body(&mut self, body: impl Into<String>) -> Result<()> {
        self.require_state("edit", PipelineState::Ready)?;
        self.composition.body = body.into();
        self.save_required = true;
        Ok(())
    }

    /// Select or clear the thread icon
    pub fn set_icon(&mut self, icon: Option<PostIcon>) -> Result<()> {
        self.require_state("edit", PipelineState::Ready)?;
        self.composition.icon = icon;
        self.save_required = true;
        Ok(())
    }

    /// Toggle the signature option
    pub fn set_signature(&mut self, enabled: bool) -> Result<()> {
        self.require_state("edit", PipelineState::Ready)?;
        self.composition.options.signature = enabled;
        Ok(())
    }

    /// Toggle the disable-smilies option
    pub fn set_disable_smilies(&mut self, enabled: bool) -> Result<()> {
        self.require_state("edit", PipelineState::Ready)?;
        self.composition.options.disable_smilies = enabled;
        Ok(())
    }

    /// Validate and attach a local file
    ///
    /// The outcome replaces any previous attachment: a rejected file leaves
    /// the post with no attachment.
    pub async fn attach(&mut self, path: impl Into<PathBuf>) -> Result<AttachmentOutcome> {
        self.check_attachments_allowed()?;
        let outcome = self.validator.validate_async(path.into()).await;
        self.apply_attachment(&outcome);
        Ok(outcome)
    }

    /// Resolve a platform file reference, then validate and attach it
    pub async fn attach_reference(
        &mut self,
        resolver: &dyn FileResolver,
        reference: &str,
    ) -> Result<AttachmentOutcome> {
        self.check_attachments_allowed()?;
        let outcome = self.validator.validate_reference(resolver, reference).await;
        self.apply_attachment(&outcome);
        Ok(outcome)
    }

    /// Drop the attachment, if any
    pub fn remove_attachment(&mut self) -> Result<()> {
        self.require_state("remove_attachment", PipelineState::Ready)?;
        if self.composition.attachment.take().is_some() {
            self.save_required = true;
            self.emit_event(Event::AttachmentChanged {
                target: self.target,
                result: None,
            });
        }
        Ok(())
    }

    fn check_attachments_allowed(&mut self) -> Result<()> {
        self.require_state("attach", PipelineState::Ready)?;
        if !self.validator.limits().enabled {
            return Err(Error::Validation(ValidationError::AttachmentsDisabled));
        }
        Ok(())
    }

    fn apply_attachment(&mut self, outcome: &AttachmentOutcome) {
        if outcome.is_ok() {
            tracing::info!(identity = %self.target, message = %outcome.message(), "Attachment accepted");
        } else {
            tracing::info!(identity = %self.target, message = %outcome.message(), "Attachment rejected");
        }

        self.composition.attachment = outcome.accepted_path().map(|p| p.to_path_buf());
        self.save_required = true;
        self.emit_event(Event::AttachmentChanged {
            target: self.target,
            result: Some(outcome.to_result()),
        });
    }
}

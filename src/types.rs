//! Core types for forum-composer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a composition session targets
///
/// Forum, thread and post ids live in separate number spaces on the forum, so
/// the variant is part of the identity and of the draft key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ThreadIdentity {
    /// Start a new thread in the given forum
    NewThread {
        /// Forum the thread is created in
        forum_id: i64,
    },
    /// Reply to an existing thread
    Reply {
        /// Thread being replied to
        thread_id: i64,
    },
    /// Edit an existing post
    EditPost {
        /// Post being edited
        post_id: i64,
    },
}

impl ThreadIdentity {
    pub(crate) const NEW_THREAD: &'static str = "new_thread";
    pub(crate) const REPLY: &'static str = "reply";
    pub(crate) const EDIT_POST: &'static str = "edit_post";

    /// Create an identity for a new thread in `forum_id`
    pub fn new_thread(forum_id: i64) -> Self {
        Self::NewThread { forum_id }
    }

    /// Create an identity for a reply to `thread_id`
    pub fn reply(thread_id: i64) -> Self {
        Self::Reply { thread_id }
    }

    /// Create an identity for editing `post_id`
    pub fn edit_post(post_id: i64) -> Self {
        Self::EditPost { post_id }
    }

    /// Key column value distinguishing the variants in storage
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewThread { .. } => Self::NEW_THREAD,
            Self::Reply { .. } => Self::REPLY,
            Self::EditPost { .. } => Self::EDIT_POST,
        }
    }

    /// The raw forum/thread/post id
    pub fn id(&self) -> i64 {
        match *self {
            Self::NewThread { forum_id } => forum_id,
            Self::Reply { thread_id } => thread_id,
            Self::EditPost { post_id } => post_id,
        }
    }

    /// Rebuild an identity from its storage parts
    pub fn from_parts(kind: &str, id: i64) -> Option<Self> {
        match kind {
            Self::NEW_THREAD => Some(Self::new_thread(id)),
            Self::REPLY => Some(Self::reply(id)),
            Self::EDIT_POST => Some(Self::edit_post(id)),
            _ => None,
        }
    }

    /// Ids must be positive; the forum never issues zero or negative ids
    pub fn is_valid(&self) -> bool {
        self.id() > 0
    }
}

impl std::fmt::Display for ThreadIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewThread { forum_id } => write!(f, "new thread in forum {}", forum_id),
            Self::Reply { thread_id } => write!(f, "reply to thread {}", thread_id),
            Self::EditPost { post_id } => write!(f, "edit of post {}", post_id),
        }
    }
}

/// Anti-forgery tokens and checkbox state scraped from a posting form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormTokens {
    /// Value of the `formkey` hidden input
    pub form_key: String,
    /// Value of the `form_cookie` hidden input
    pub form_cookie: String,
    /// Whether "bookmark this thread" is pre-checked
    pub bookmark_checked: bool,
    /// Whether "show signature" is pre-checked (false when the form omits it)
    pub signature_checked: bool,
    /// Whether "disable smilies" is pre-checked
    pub disable_smilies_checked: bool,
}

/// A thread icon chosen in the icon picker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostIcon {
    /// Forum-side icon id, sent as `iconid`
    pub id: String,
    /// Image URL, kept so the picker can redisplay it
    pub url: String,
}

/// The three boolean posting options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOptions {
    /// Append the user's signature
    pub signature: bool,
    /// Do not convert smiley codes
    pub disable_smilies: bool,
    /// Bookmark the thread after posting
    pub bookmark: bool,
}

impl From<&FormTokens> for PostOptions {
    fn from(tokens: &FormTokens) -> Self {
        Self {
            signature: tokens.signature_checked,
            disable_smilies: tokens.disable_smilies_checked,
            bookmark: tokens.bookmark_checked,
        }
    }
}

/// A locally persisted, not-yet-submitted post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Post body, stored untrimmed
    pub content: String,
    /// Thread subject
    pub subject: String,
    /// Selected icon id
    pub icon_id: Option<String>,
    /// Selected icon URL
    pub icon_url: Option<String>,
    /// When the draft was saved (millisecond precision)
    pub timestamp: DateTime<Utc>,
}

impl Draft {
    /// Create a draft stamped with the current time
    pub fn new(content: impl Into<String>, subject: impl Into<String>, icon: Option<&PostIcon>) -> Self {
        let now = Utc::now();
        Self {
            content: content.into(),
            subject: subject.into(),
            icon_id: icon.map(|i| i.id.clone()),
            icon_url: icon.map(|i| i.url.clone()),
            // storage keeps milliseconds; truncate so a reload compares equal
            timestamp: DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now),
        }
    }

    /// Whether the body has anything besides whitespace
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// The saved icon, only when both id and url are present
    pub fn icon(&self) -> Option<PostIcon> {
        match (&self.icon_id, &self.icon_url) {
            (Some(id), Some(url)) => Some(PostIcon {
                id: id.clone(),
                url: url.clone(),
            }),
            _ => None,
        }
    }
}

/// The outbound payload for one preview or submit attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedPost {
    /// Target forum/thread/post
    pub target: ThreadIdentity,
    /// Anti-forgery form key from the most recent form load
    pub form_key: String,
    /// Anti-forgery form cookie from the most recent form load
    pub form_cookie: String,
    /// Thread subject
    pub subject: String,
    /// Post body
    pub body: String,
    /// Selected icon
    pub icon: Option<PostIcon>,
    /// Validated attachment, if any
    pub attachment: Option<PathBuf>,
    /// Signature / smilies / bookmark
    pub options: PostOptions,
}

/// Outcome of validating an attachment, in the shape shown to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentResult {
    /// Path that was checked (empty when no path could be resolved)
    pub path: String,
    /// Whether the file was accepted
    pub ok: bool,
    /// Human-readable confirmation or rejection
    pub message: String,
}

/// Submission pipeline state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Fetching the form and checking for a draft
    Loading,
    /// Form loaded; accepting edits, preview and submit
    Ready,
    /// Waiting for a preview render
    Previewing,
    /// Waiting for the forum to accept the post
    Submitting,
    /// The post was accepted (terminal)
    Posted,
    /// The session was abandoned or could not load (terminal)
    Cancelled,
}

impl PipelineState {
    /// Whether the pipeline has exited
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Posted | PipelineState::Cancelled)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Loading => "loading",
            PipelineState::Ready => "ready",
            PipelineState::Previewing => "previewing",
            PipelineState::Submitting => "submitting",
            PipelineState::Posted => "posted",
            PipelineState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Event emitted by the pipeline
///
/// Subscribe via [`SubmissionPipeline::subscribe`](crate::SubmissionPipeline::subscribe)
/// to drive progress dialogs, toasts and retry affordances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The pipeline moved between states
    StateChanged {
        /// Session target
        target: ThreadIdentity,
        /// Previous state
        from: PipelineState,
        /// New state
        to: PipelineState,
    },

    /// A stored draft was found and awaits a use/discard decision
    DraftFound {
        /// Session target
        target: ThreadIdentity,
        /// "1h 5m 2s"-style age of the draft
        saved_ago: String,
    },

    /// The current content was written to the draft store
    DraftSaved {
        /// Session target
        target: ThreadIdentity,
    },

    /// The stored draft was removed
    DraftDeleted {
        /// Session target
        target: ThreadIdentity,
    },

    /// Loading the form failed; the pipeline cancels after a display delay
    LoadFailed {
        /// Session target
        target: ThreadIdentity,
        /// Error message
        error: String,
    },

    /// Preview could not be rendered; the caller may retry
    PreviewFailed {
        /// Session target
        target: ThreadIdentity,
        /// Error message
        error: String,
    },

    /// Submission failed and the content fell back to a local draft
    SubmitFailed {
        /// Session target
        target: ThreadIdentity,
        /// Error message
        error: String,
        /// Whether the fallback save succeeded
        draft_saved: bool,
    },

    /// An attachment was accepted, rejected or removed
    AttachmentChanged {
        /// Session target
        target: ThreadIdentity,
        /// Validation result (`None` when the attachment was removed)
        result: Option<AttachmentResult>,
    },

    /// The forum accepted the post
    Posted {
        /// Session target
        target: ThreadIdentity,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parts_round_trip() {
        for identity in [
            ThreadIdentity::new_thread(12),
            ThreadIdentity::reply(3400),
            ThreadIdentity::edit_post(987654),
        ] {
            assert_eq!(
                ThreadIdentity::from_parts(identity.kind(), identity.id()),
                Some(identity)
            );
        }
        assert_eq!(ThreadIdentity::from_parts("forum", 1), None);
    }

    #[test]
    fn test_identity_variants_are_distinct() {
        assert_ne!(ThreadIdentity::new_thread(5), ThreadIdentity::edit_post(5));
        assert_ne!(
            ThreadIdentity::new_thread(5).kind(),
            ThreadIdentity::edit_post(5).kind()
        );
    }

    #[test]
    fn test_identity_validity() {
        assert!(ThreadIdentity::new_thread(1).is_valid());
        assert!(!ThreadIdentity::new_thread(0).is_valid());
        assert!(!ThreadIdentity::reply(-4).is_valid());
    }

    #[test]
    fn test_draft_icon_requires_both_parts() {
        let mut draft = Draft::new("body", "subject", None);
        assert_eq!(draft.icon(), None);

        draft.icon_id = Some("42".into());
        assert_eq!(draft.icon(), None);

        draft.icon_url = Some("https://example.com/icon.gif".into());
        assert_eq!(
            draft.icon(),
            Some(PostIcon {
                id: "42".into(),
                url: "https://example.com/icon.gif".into()
            })
        );
    }

    #[test]
    fn test_draft_timestamp_is_millisecond_precise() {
        let draft = Draft::new("body", "", None);
        assert_eq!(draft.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_draft_has_content() {
        assert!(Draft::new("\n\nhello\n", "", None).has_content());
        assert!(!Draft::new(" \t\n", "", None).has_content());
    }

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::Posted.is_terminal());
        assert!(PipelineState::Cancelled.is_terminal());
        assert!(!PipelineState::Ready.is_terminal());
        assert!(!PipelineState::Submitting.is_terminal());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::StateChanged {
            target: ThreadIdentity::new_thread(7),
            from: PipelineState::Loading,
            to: PipelineState::Ready,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["target"]["kind"], "new_thread");
        assert_eq!(json["to"], "ready");
    }
}

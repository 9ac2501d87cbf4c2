//! Error types for forum-composer
//!
//! This module provides the error taxonomy of the composition pipeline:
//! - [`ParseError`] - the posting form was missing required elements (fatal for a load)
//! - [`TransportError`] - network or server failure (recoverable via state transitions)
//! - [`ValidationError`] - the user's input cannot be sent (no I/O, no transition)
//! - [`DatabaseError`] - draft persistence failures
//!
//! Everything is folded into [`Error`] so callers can use `?` throughout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for forum-composer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for forum-composer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "forum.base_url")
        key: Option<String>,
    },

    /// The posting form could not be scraped
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Network or forum server failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The composed post or attachment was rejected locally
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Draft persistence failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Operation not allowed in the pipeline's current state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The operation that was attempted (e.g., "submit", "use_draft")
        operation: String,
        /// The state that prevents the operation
        state: String,
    },

    /// The hosting context cancelled an outstanding request
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while scraping a posting form or a response page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `formkey` or `form_cookie` missing, valueless or empty
    #[error("missing anti-forgery token ({name})")]
    MissingToken {
        /// Name attribute of the missing token element
        name: String,
    },

    /// A required option checkbox is absent from the form
    #[error("missing form option '{name}'")]
    MissingOption {
        /// Name attribute of the missing checkbox
        name: String,
    },

    /// The preview response did not contain a rendered post body
    #[error("preview response has no rendered post")]
    MissingPreview,

    /// A CSS selector failed to compile
    #[error("invalid selector {selector}: {reason}")]
    Selector {
        /// The selector source
        selector: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Network and forum-server failures
///
/// Each variant renders as a message suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("network error: {0}")]
    Network(String),

    /// The forum answered with a non-success HTTP status
    #[error("forum returned HTTP {code}")]
    Status {
        /// HTTP status code
        code: u16,
    },

    /// The forum answered with an error page instead of accepting the post
    #[error("forum rejected the post: {message}")]
    Rejected {
        /// Text of the forum's error banner
        message: String,
    },

    /// The response body could not be understood
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// The attachment could not be read for upload
    #[error("could not read attachment {path}: {reason}")]
    Attachment {
        /// Attachment path
        path: String,
        /// Underlying failure
        reason: String,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => TransportError::Status {
                code: status.as_u16(),
            },
            None => TransportError::Network(e.to_string()),
        }
    }
}

/// Local validation failures; reported to the caller without any I/O
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidationError {
    /// The post body is empty or whitespace-only
    #[error("the post body is empty")]
    EmptyBody,

    /// A draft with empty trimmed content was handed to the store
    #[error("refusing to save a draft with no content")]
    EmptyDraft,

    /// Attachments are switched off for this account
    #[error("attachments are not enabled")]
    AttachmentsDisabled,

    /// The forum, thread or post id is not a positive number
    #[error("invalid target id {id}")]
    InvalidTarget {
        /// The rejected id
        id: i64,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl Error {
    /// Short machine-readable code, used in events and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Parse(_) => "parse_error",
            Error::Transport(e) => match e {
                TransportError::Network(_) => "network_error",
                TransportError::Status { .. } => "http_status",
                TransportError::Rejected { .. } => "rejected",
                TransportError::InvalidResponse(_) => "invalid_response",
                TransportError::Attachment { .. } => "attachment_unreadable",
            },
            Error::Validation(e) => match e {
                ValidationError::EmptyBody => "empty_body",
                ValidationError::EmptyDraft => "empty_draft",
                ValidationError::AttachmentsDisabled => "attachments_disabled",
                ValidationError::InvalidTarget { .. } => "invalid_target",
            },
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::InvalidState { .. } => "invalid_state",
            Error::Cancelled => "cancelled",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the user can sensibly try the same action again
    ///
    /// Parse failures mean the page cannot be posted to at all; validation
    /// failures need the user to change their input first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Cancelled)
    }
}

//! # forum-composer
//!
//! Thread composition and submission for a discussion forum that only speaks
//! HTML forms.
//!
//! ## Design Philosophy
//!
//! forum-composer is designed to be:
//! - **Lossless** - A failed submission always leaves the user's text in a draft
//! - **Library-first** - No UI; the host drives the pipeline and renders its events
//! - **Injectable** - Forum requests and draft storage sit behind traits
//! - **Event-driven** - Consumers subscribe to events for toasts and dialogs
//!
//! ## Quick Start
//!
//! ```no_run
//! use forum_composer::{
//!     Config, Database, HttpTransport, LoadOutcome, SubmissionPipeline, SubmitOutcome,
//!     ThreadIdentity,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let transport = Arc::new(HttpTransport::new(&config.forum)?);
//!     let drafts = Arc::new(Database::new(&config.persistence.database_path).await?);
//!
//!     let mut pipeline =
//!         SubmissionPipeline::new(ThreadIdentity::reply(3456), transport, drafts, &config)?;
//!
//!     if let LoadOutcome::DraftAvailable(offer) = pipeline.load().await? {
//!         println!("Found a draft from {} ago", offer.saved_ago);
//!         pipeline.use_draft()?;
//!     }
//!
//!     pipeline.set_body("Hello, thread!")?;
//!     match pipeline.submit().await? {
//!         SubmitOutcome::Posted => println!("posted"),
//!         SubmitOutcome::Failed { message, .. } => println!("kept as draft: {}", message),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Attachment validation
pub mod attachment;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Compact duration formatting
pub mod duration;
/// Error types
pub mod error;
/// Submission pipeline (decomposed into focused submodules)
pub mod pipeline;
/// Posting-form scraping
pub mod scrape;
/// Forum transport trait and HTTP implementation
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use attachment::{AttachmentOutcome, AttachmentValidator, FileResolver, ResolveError};
pub use config::{AttachmentConfig, Config, ForumConfig, PersistenceConfig, PipelineConfig};
pub use db::{Database, DraftStore};
pub use error::{
    DatabaseError, Error, ParseError, Result, TransportError, ValidationError,
};
pub use pipeline::{
    DraftOffer, LeaveChoice, LoadOutcome, PreviewOutcome, SubmissionPipeline, SubmitOutcome,
};
pub use transport::{HttpTransport, Transport};
pub use types::{
    AttachmentResult, ComposedPost, Draft, Event, FormTokens, PipelineState, PostIcon,
    PostOptions, ThreadIdentity,
};

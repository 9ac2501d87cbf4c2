//! Attachment validation
//!
//! Checks a local file against the forum's upload rules before it is ever
//! sent: readable regular file, image extension, byte size, and pixel
//! dimensions. Dimensions come from the image header only; pixel data is
//! never decoded.
//!
//! Turning a platform file reference (a picker result, a `content://` URI, ...)
//! into a path is the host's job, surfaced here as the [`FileResolver`] trait.

use crate::config::AttachmentConfig;
use crate::types::AttachmentResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions the forum accepts, lowercase
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// Why a platform reference could not be turned into a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The reference points at nothing
    #[error("file not found")]
    NotFound,
    /// The reference exists but cannot be read (permissions, remote-only, ...)
    #[error("file is not readable")]
    Unreadable,
    /// The reference uses a scheme the resolver does not handle
    #[error("unsupported reference scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Resolves an opaque platform file reference to a local path
#[async_trait]
pub trait FileResolver: Send + Sync {
    /// Resolve `reference` to a filesystem path
    async fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError>;
}

/// Typed result of validating one attachment
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    /// The file can be attached
    Attached {
        /// The path, unchanged
        path: PathBuf,
        /// File name for display
        filename: String,
    },
    /// Not a readable regular file
    NotFound {
        /// Checked path
        path: PathBuf,
        /// File name for display
        filename: String,
    },
    /// Not a jpg/png/gif, or the image header is unreadable
    WrongType {
        /// Checked path
        path: PathBuf,
        /// File name for display
        filename: String,
    },
    /// Larger than the configured byte limit
    TooLarge {
        /// Checked path
        path: PathBuf,
        /// File name for display
        filename: String,
        /// Measured size in bytes
        size: u64,
        /// Configured limit in bytes
        max_bytes: u64,
    },
    /// Wider or taller than the configured limits
    ResolutionTooLarge {
        /// Checked path
        path: PathBuf,
        /// File name for display
        filename: String,
        /// Measured width in pixels
        width: u32,
        /// Measured height in pixels
        height: u32,
        /// Configured width limit
        max_width: u32,
        /// Configured height limit
        max_height: u32,
    },
    /// The platform reference could not be resolved to a path
    Unresolved {
        /// Resolver failure
        reason: ResolveError,
    },
}

impl AttachmentOutcome {
    /// Whether the file was accepted
    pub fn is_ok(&self) -> bool {
        matches!(self, AttachmentOutcome::Attached { .. })
    }

    /// The accepted path, if any
    pub fn accepted_path(&self) -> Option<&Path> {
        match self {
            AttachmentOutcome::Attached { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Message for the user
    pub fn message(&self) -> String {
        match self {
            AttachmentOutcome::Attached { filename, .. } => format!("Attached {}", filename),
            AttachmentOutcome::NotFound { filename, .. } => {
                format!("Unable to read {}", filename)
            }
            AttachmentOutcome::WrongType { filename, .. } => format!(
                "{} is not a supported image (jpg, jpeg, png, gif)",
                filename
            ),
            AttachmentOutcome::TooLarge {
                filename,
                size,
                max_bytes,
                ..
            } => format!(
                "{} is too large ({} KB, limit {} KB)",
                filename,
                size.div_ceil(1024),
                max_bytes / 1024
            ),
            AttachmentOutcome::ResolutionTooLarge {
                filename,
                width,
                height,
                max_width,
                max_height,
                ..
            } => format!(
                "{} is {}x{}, larger than the {}x{} limit",
                filename, width, height, max_width, max_height
            ),
            AttachmentOutcome::Unresolved { reason } => {
                format!("Couldn't get the file: {}", reason)
            }
        }
    }

    /// Collapse into the `{path, ok, message}` shape shown to the user
    pub fn to_result(&self) -> AttachmentResult {
        let path = match self {
            AttachmentOutcome::Attached { path, .. }
            | AttachmentOutcome::NotFound { path, .. }
            | AttachmentOutcome::WrongType { path, .. }
            | AttachmentOutcome::TooLarge { path, .. }
            | AttachmentOutcome::ResolutionTooLarge { path, .. } => path.display().to_string(),
            AttachmentOutcome::Unresolved { .. } => String::new(),
        };
        AttachmentResult {
            path,
            ok: self.is_ok(),
            message: self.message(),
        }
    }
}

/// Validates candidate attachments against configured limits
#[derive(Debug, Clone)]
pub struct AttachmentValidator {
    limits: AttachmentConfig,
}

impl AttachmentValidator {
    /// Create a validator with the given limits
    pub fn new(limits: AttachmentConfig) -> Self {
        Self { limits }
    }

    /// The configured limits
    pub fn limits(&self) -> &AttachmentConfig {
        &self.limits
    }

    /// Validate a local path
    ///
    /// Total: every input yields exactly one outcome, checks run in order
    /// readable file, extension, byte size, resolution.
    pub fn validate(&self, path: &Path) -> AttachmentOutcome {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let path_buf = path.to_path_buf();

        let metadata = match std::fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            _ => {
                return AttachmentOutcome::NotFound {
                    path: path_buf,
                    filename,
                };
            }
        };
        if let Err(e) = std::fs::File::open(path) {
            tracing::debug!(path = %path.display(), error = %e, "Attachment not readable");
            return AttachmentOutcome::NotFound {
                path: path_buf,
                filename,
            };
        }

        let lower = filename.to_lowercase();
        if !ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return AttachmentOutcome::WrongType {
                path: path_buf,
                filename,
            };
        }

        if metadata.len() > self.limits.max_bytes {
            return AttachmentOutcome::TooLarge {
                path: path_buf,
                filename,
                size: metadata.len(),
                max_bytes: self.limits.max_bytes,
            };
        }

        let (width, height) = match image::image_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Attachment header not decodable");
                return AttachmentOutcome::WrongType {
                    path: path_buf,
                    filename,
                };
            }
        };
        if width > self.limits.max_width || height > self.limits.max_height {
            return AttachmentOutcome::ResolutionTooLarge {
                path: path_buf,
                filename,
                width,
                height,
                max_width: self.limits.max_width,
                max_height: self.limits.max_height,
            };
        }

        AttachmentOutcome::Attached {
            path: path_buf,
            filename,
        }
    }

    /// Validate on the blocking pool so file inspection never stalls the caller
    pub async fn validate_async(&self, path: PathBuf) -> AttachmentOutcome {
        let validator = self.clone();
        let fallback_path = path.clone();
        match tokio::task::spawn_blocking(move || validator.validate(&path)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Attachment validation task failed");
                let filename = fallback_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                AttachmentOutcome::NotFound {
                    path: fallback_path,
                    filename,
                }
            }
        }
    }

    /// Resolve a platform reference, then validate the resulting path
    pub async fn validate_reference(
        &self,
        resolver: &dyn FileResolver,
        reference: &str,
    ) -> AttachmentOutcome {
        match resolver.resolve(reference).await {
            Ok(path) => self.validate_async(path).await,
            Err(reason) => {
                tracing::warn!(reference, error = %reason, "Could not resolve attachment reference");
                AttachmentOutcome::Unresolved { reason }
            }
        }
    }
}

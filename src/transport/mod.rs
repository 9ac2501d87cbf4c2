//! Forum transport
//!
//! The pipeline talks to the forum only through [`Transport`]: fetch the
//! posting form, submit a post, or ask for a preview render. [`HttpTransport`]
//! implements it over `reqwest` using the forum's HTML form protocol; tests
//! and hosts with their own request queue can supply another implementation.

use crate::error::TransportError;
use crate::types::{ComposedPost, ThreadIdentity};
use async_trait::async_trait;

mod http;

pub use http::HttpTransport;

/// Request seam between the submission pipeline and the forum
///
/// Each failure carries a human-readable message for the user. The pipeline
/// never retries on its own; a failed call turns into a state transition.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the raw HTML of the posting form for `target`
    async fn fetch_form(&self, target: &ThreadIdentity) -> Result<String, TransportError>;

    /// Submit the post
    async fn submit(&self, post: &ComposedPost) -> Result<(), TransportError>;

    /// Ask the forum to render the post, returning the rendered HTML fragment
    async fn preview(&self, post: &ComposedPost) -> Result<String, TransportError>;
}

/// Whether a POST asks for a render or commits the post
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostMode {
    /// Render only
    Preview,
    /// Commit
    Submit,
}

/// Server-side script handling a target
pub fn endpoint_path(target: &ThreadIdentity) -> &'static str {
    match target {
        ThreadIdentity::NewThread { .. } => "newthread.php",
        ThreadIdentity::Reply { .. } => "newreply.php",
        ThreadIdentity::EditPost { .. } => "editpost.php",
    }
}

/// Query parameters of the GET that returns the posting form
pub fn form_query(target: &ThreadIdentity) -> Vec<(&'static str, String)> {
    let (action, id_param) = match target {
        ThreadIdentity::NewThread { .. } => ("newthread", "forumid"),
        ThreadIdentity::Reply { .. } => ("newreply", "threadid"),
        ThreadIdentity::EditPost { .. } => ("editpost", "postid"),
    };
    vec![("action", action.to_string()), (id_param, target.id().to_string())]
}

/// Form fields of a preview or submit POST, excluding the attachment file
pub fn post_fields(post: &ComposedPost, mode: PostMode) -> Vec<(&'static str, String)> {
    let (action, id_param) = match post.target {
        ThreadIdentity::NewThread { .. } => ("postthread", "forumid"),
        ThreadIdentity::Reply { .. } => ("postreply", "threadid"),
        ThreadIdentity::EditPost { .. } => ("updatepost", "postid"),
    };

    let mut fields = vec![
        ("action", action.to_string()),
        (id_param, post.target.id().to_string()),
        ("formkey", post.form_key.clone()),
        ("form_cookie", post.form_cookie.clone()),
        ("subject", encode_html(&post.subject)),
        ("message", encode_html(&post.body)),
        ("parseurl", YES.to_string()),
    ];

    if let Some(icon) = &post.icon {
        fields.push(("iconid", icon.id.clone()));
    }
    if post.options.bookmark {
        fields.push(("bookmark", YES.to_string()));
    }
    if post.options.signature {
        fields.push(("signature", YES.to_string()));
    }
    if post.options.disable_smilies {
        fields.push(("disablesmilies", YES.to_string()));
    }

    match mode {
        PostMode::Preview => fields.push(("preview", "Preview Post".to_string())),
        PostMode::Submit => fields.push(("submit", "Submit".to_string())),
    }

    fields
}

const YES: &str = "yes";

/// Replace every non-ASCII character with a numeric HTML entity
///
/// The forum decodes form input as Latin-1, so anything outside ASCII must be
/// sent as `&#NNNN;` to survive.
pub fn encode_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", c as u32));
        }
    }
    out
}

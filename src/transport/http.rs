//! `reqwest`-backed forum transport

use super::{PostMode, Transport, endpoint_path, form_query, post_fields};
use crate::config::ForumConfig;
use crate::error::TransportError;
use crate::scrape;
use crate::types::{ComposedPost, ThreadIdentity};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Talks to the forum's PHP posting scripts over HTTP
///
/// Authentication is the host's concern: hand in a client that already
/// carries the session cookies via [`HttpTransport::with_client`].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport with its own HTTP client
    pub fn new(config: &ForumConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {}", e),
                key: None,
            })?;

        Self::with_client(client, &config.base_url)
    }

    /// Build a transport around an existing client
    ///
    /// A base URL without a trailing slash is treated as a directory, so
    /// `https://host/forum` posts to `https://host/forum/newthread.php`.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("Invalid forum base URL '{}': {}", base_url, e),
            key: Some("forum.base_url".to_string()),
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("Forum base URL '{}' cannot hold a path", base_url),
                key: Some("forum.base_url".to_string()),
            });
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url: url,
        })
    }

    /// Base URL all endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, target: &ThreadIdentity) -> std::result::Result<Url, TransportError> {
        self.base_url
            .join(endpoint_path(target))
            .map_err(|e| TransportError::Network(format!("Invalid endpoint URL: {}", e)))
    }

    /// POST a preview or submit request and return the response page
    async fn post(
        &self,
        post: &ComposedPost,
        mode: PostMode,
    ) -> std::result::Result<String, TransportError> {
        let url = self.endpoint(&post.target)?;
        let fields = post_fields(post, mode);

        let request = self.client.post(url);
        let request = match &post.attachment {
            Some(path) => request.multipart(multipart_form(fields, path).await?),
            None => request.form(&fields),
        };

        let response = request.send().await?;

        // Check HTTP status before trying to read the response body
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }

        let page = response.text().await?;

        let banner = scrape::extract_error_banner(&page)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if let Some(message) = banner {
            debug!(identity = %post.target, %message, "Forum rejected the request");
            return Err(TransportError::Rejected { message });
        }

        Ok(page)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_form(&self, target: &ThreadIdentity) -> std::result::Result<String, TransportError> {
        let mut url = self.endpoint(target)?;
        url.query_pairs_mut().extend_pairs(form_query(target));

        debug!(identity = %target, %url, "Fetching posting form");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn submit(&self, post: &ComposedPost) -> std::result::Result<(), TransportError> {
        debug!(identity = %post.target, attachment = post.attachment.is_some(), "Submitting post");
        self.post(post, PostMode::Submit).await?;
        Ok(())
    }

    async fn preview(&self, post: &ComposedPost) -> std::result::Result<String, TransportError> {
        debug!(identity = %post.target, "Requesting preview");
        let page = self.post(post, PostMode::Preview).await?;
        scrape::extract_preview(&page).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

/// Multipart body carrying the post fields plus the attachment file
async fn multipart_form(
    fields: Vec<(&'static str, String)>,
    path: &Path,
) -> std::result::Result<multipart::Form, TransportError> {
    let attachment_error = |reason: String| TransportError::Attachment {
        path: path.display().to_string(),
        reason,
    };

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| attachment_error(e.to_string()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    let part = multipart::Part::bytes(bytes)
        .file_name(filename)
        .mime_str(mime_for(path))
        .map_err(|e| attachment_error(e.to_string()))?;

    let form = fields
        .into_iter()
        .fold(multipart::Form::new(), |form, (name, value)| form.text(name, value));

    Ok(form.part("attachment", part))
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

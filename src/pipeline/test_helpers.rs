//! Shared test helpers for driving SubmissionPipeline instances in tests.

use crate::config::Config;
use crate::db::{Database, DraftStore};
use crate::error::{DatabaseError, Error, Result, TransportError};
use crate::pipeline::SubmissionPipeline;
use crate::transport::Transport;
use crate::types::{ComposedPost, Draft, ThreadIdentity};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Posting form with the given token values and all three checkboxes
pub(crate) fn form_page(form_key: &str, form_cookie: &str) -> String {
    format!(
        r#"<html><body><form method="post" action="newreply.php">
<input type="hidden" name="formkey" value="{form_key}">
<input type="hidden" name="form_cookie" value="{form_cookie}">
<input type="checkbox" name="signature" value="yes" checked>
<input type="checkbox" name="disablesmilies" value="yes">
<input type="checkbox" name="bookmark" value="yes" checked>
</form></body></html>"#
    )
}

/// Scripted transport recording every call
///
/// Queued results are consumed first; once a queue is empty the call
/// succeeds with a default response.
#[derive(Default)]
pub(crate) struct FakeTransport {
    forms: Mutex<VecDeque<std::result::Result<String, TransportError>>>,
    submits: Mutex<VecDeque<std::result::Result<(), TransportError>>>,
    previews: Mutex<VecDeque<std::result::Result<String, TransportError>>>,
    /// Posts handed to `submit` or `preview`, in order
    pub(crate) sent: Mutex<Vec<ComposedPost>>,
    pub(crate) fetch_count: AtomicUsize,
    pub(crate) submit_count: AtomicUsize,
    pub(crate) preview_count: AtomicUsize,
    /// When set, `submit` never completes
    pub(crate) hang_submit: AtomicBool,
    form_counter: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_form(&self, result: std::result::Result<String, TransportError>) {
        self.forms.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_submit(&self, result: std::result::Result<(), TransportError>) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_preview(&self, result: std::result::Result<String, TransportError>) {
        self.previews.lock().unwrap().push_back(result);
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub(crate) fn submits(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub(crate) fn previews(&self) -> usize {
        self.preview_count.load(Ordering::SeqCst)
    }

    pub(crate) fn last_sent(&self) -> ComposedPost {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_form(
        &self,
        _target: &ThreadIdentity,
    ) -> std::result::Result<String, TransportError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let queued = self.forms.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            // each default form carries fresh tokens
            let n = self.form_counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(form_page(&format!("key{n}"), &format!("cookie{n}")))
        })
    }

    async fn submit(&self, post: &ComposedPost) -> std::result::Result<(), TransportError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(post.clone());
        if self.hang_submit.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let queued = self.submits.lock().unwrap().pop_front();
        queued.unwrap_or(Ok(()))
    }

    async fn preview(&self, post: &ComposedPost) -> std::result::Result<String, TransportError> {
        self.preview_count.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(post.clone());
        let queued = self.previews.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok("<b>rendered</b>".to_string()))
    }
}

/// Draft store whose every operation fails
pub(crate) struct BrokenDraftStore;

fn broken() -> Error {
    Error::Database(DatabaseError::QueryFailed("disk I/O error".to_string()))
}

#[async_trait]
impl DraftStore for BrokenDraftStore {
    async fn load_draft(&self, _id: &ThreadIdentity) -> Result<Option<Draft>> {
        Err(broken())
    }

    async fn save_draft(&self, _id: &ThreadIdentity, _draft: &Draft) -> Result<()> {
        Err(broken())
    }

    async fn delete_draft(&self, _id: &ThreadIdentity) -> Result<()> {
        Err(broken())
    }
}

/// Config with a short load-failure delay so failure paths stay fast
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.load_failure_delay = Duration::from_millis(20);
    config
}

/// Helper to create a pipeline backed by a real database in a tempdir.
/// Returns the pipeline, the database and the tempdir (which must be kept alive).
pub(crate) async fn create_test_pipeline(
    target: ThreadIdentity,
    transport: Arc<FakeTransport>,
) -> (SubmissionPipeline, Arc<Database>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::new(&temp_dir.path().join("drafts.db")).await.unwrap());

    let pipeline =
        SubmissionPipeline::new(target, transport, db.clone(), &test_config()).unwrap();

    (pipeline, db, temp_dir)
}

/// Pipeline that has loaded its form (no stored draft) and holds `body`
pub(crate) async fn ready_pipeline(
    target: ThreadIdentity,
    transport: Arc<FakeTransport>,
    body: &str,
) -> (SubmissionPipeline, Arc<Database>, TempDir) {
    let (mut pipeline, db, dir) = create_test_pipeline(target, transport).await;
    pipeline.load().await.unwrap();
    pipeline.set_subject("test").unwrap();
    pipeline.set_body(body).unwrap();
    (pipeline, db, dir)
}

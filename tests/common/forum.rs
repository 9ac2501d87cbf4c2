//! Mock forum server built on wiremock

use forum_composer::{Config, Database, HttpTransport, SubmissionPipeline, ThreadIdentity};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Posting form carrying the given tokens
pub fn form_page(form_key: &str, form_cookie: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Post Reply</title></head><body>
<div id="content">
  <form name="vbform" action="newreply.php" method="post" enctype="multipart/form-data">
    <input type="hidden" name="action" value="postreply">
    <input type="hidden" name="threadid" value="3456">
    <input type="hidden" name="formkey" value="{form_key}">
    <input type="hidden" name="form_cookie" value="{form_cookie}">
    <textarea name="message"></textarea>
    <div class="options">
      <label><input type="checkbox" name="parseurl" value="yes" checked> Parse URLs</label>
      <label><input type="checkbox" name="bookmark" value="yes"> Bookmark</label>
      <label><input type="checkbox" name="disablesmilies" value="yes"> Disable smilies</label>
      <label><input type="checkbox" name="signature" value="yes" checked> Show signature</label>
    </div>
  </form>
</div>
</body></html>"#
    )
}

/// Forum error page, returned with HTTP 200
pub fn error_page(message: &str) -> String {
    format!(
        r#"<html><body><div class="standarderror"><div class="inner">{message}</div></div></body></html>"#
    )
}

/// Serve the reply form for thread 3456 once, with the given tokens
pub async fn mount_reply_form(server: &MockServer, form_key: &str, form_cookie: &str) {
    Mock::given(method("GET"))
        .and(path("/newreply.php"))
        .and(query_param("action", "newreply"))
        .and(query_param("threadid", "3456"))
        .respond_with(ResponseTemplate::new(200).set_body_string(form_page(form_key, form_cookie)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// A pipeline for thread 3456 wired to `server` and a fresh database.
/// Returns the pipeline, the database and the tempdir (which must be kept alive).
pub async fn reply_pipeline(server: &MockServer) -> (SubmissionPipeline, Arc<Database>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.forum.base_url = format!("{}/", server.uri());
    config.persistence.database_path = temp_dir.path().join("drafts.db");
    config.pipeline.load_failure_delay = std::time::Duration::from_millis(10);
    config.validate().unwrap();

    let transport = Arc::new(HttpTransport::new(&config.forum).unwrap());
    let db = Arc::new(Database::new(&config.persistence.database_path).await.unwrap());

    let pipeline =
        SubmissionPipeline::new(ThreadIdentity::reply(3456), transport, db.clone(), &config)
            .unwrap();

    (pipeline, db, temp_dir)
}

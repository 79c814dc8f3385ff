//! Reload script injection for HTML documents.
//!
//! Documents are re-read from disk on every request and rewritten in memory,
//! so an edit is visible on the very next load.

use std::path::Path;

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};

/// Client-side listener embedded into every served HTML document.
///
/// Relies on the browser's built-in `EventSource` reconnect after errors.
pub const RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var source = new EventSource("/_events");
  source.onopen = function () {
    console.log("[hotserve] live reload connected");
  };
  source.onmessage = function (event) {
    if (event.data === "reload") {
      console.log("[hotserve] reloading");
      location.reload();
    }
  };
  source.onerror = function () {
    console.log("[hotserve] live reload disconnected, retrying");
  };
})();
</script>
"#;

const BODY_CLOSE: &[u8] = b"</body>";

/// Insert [`RELOAD_SCRIPT`] into a document.
///
/// The script goes immediately before the last `</body>`, or at the end of
/// the document when there is none. No other byte is altered.
#[must_use]
pub fn inject_script(content: &[u8]) -> Vec<u8> {
    let script = RELOAD_SCRIPT.as_bytes();
    let split = memchr::memmem::rfind(content, BODY_CLOSE).unwrap_or(content.len());

    let mut out = Vec::with_capacity(content.len() + script.len());
    out.extend_from_slice(&content[..split]);
    out.extend_from_slice(script);
    out.extend_from_slice(&content[split..]);
    out
}

/// Read `file` and respond with its contents, with the reload script
/// injected when `inject` is set.
///
/// Returns `None` if the file cannot be read; the caller falls back to the
/// static delegate.
pub(crate) async fn serve_document(file: &Path, inject: bool) -> Option<Response> {
    let content = match tokio::fs::read(file).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "Failed to read document");
            return None;
        }
    };

    let body = if inject {
        inject_script(&content)
    } else {
        content
    };
    let length = body.len();

    let mut response = ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    Some(response)
}

//! Static file serving.
//!
//! Requests that are not rewritten go to `tower-http`'s `ServeDir`, which
//! handles MIME types, 404s, ranges and `index.html` for directories.
//! Directories without an `index.html` get a generated listing instead of
//! a 404.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use axum::body::Body;
use axum::http::Request;
use axum::response::{Html, IntoResponse, Response};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tower::ServiceExt;

use crate::router::resolve_under_root;
use crate::state::AppState;

/// Characters escaped in listing links.
const LINK_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Serve a request unchanged from the root directory.
pub(crate) async fn serve_static(state: &AppState, req: Request<Body>) -> Response {
    if let Some(listing) = directory_listing(state, req.uri().path()).await {
        return listing;
    }

    match state.static_files.clone().oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// Render a listing for `/dir/` requests whose directory has no `index.html`.
async fn directory_listing(state: &AppState, url_path: &str) -> Option<Response> {
    if !url_path.ends_with('/') {
        return None;
    }
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    let dir = resolve_under_root(&state.root, &decoded)?;
    let is_dir = tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir());
    if !is_dir
        || tokio::fs::try_exists(dir.join("index.html"))
            .await
            .unwrap_or(false)
    {
        return None;
    }

    match render_listing(&dir, &decoded).await {
        Ok(page) => Some(Html(page).into_response()),
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Failed to list directory");
            None
        }
    }
}

/// Build the HTML listing of `dir`, shown under the URL `url_path`.
pub(crate) async fn render_listing(dir: &Path, url_path: &str) -> io::Result<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by_key(|name| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(url_path));
    let mut page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &names {
        let (stem, slash) = match name.strip_suffix('/') {
            Some(stem) => (stem, "/"),
            None => (name.as_str(), ""),
        };
        let href = utf8_percent_encode(stem, LINK_ESCAPE);
        let _ = writeln!(
            page,
            "<li><a href=\"{href}{slash}\">{}</a></li>",
            escape_html(name)
        );
    }
    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Ok(page)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

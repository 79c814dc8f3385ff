//! Request classification.
//!
//! Decides which of the three handlers serves a request. Exactly one route is
//! chosen per request; the handlers themselves live in their own modules.

use std::path::{Component, Path, PathBuf};

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::live_reload::EVENTS_PATH;
use crate::state::{AppState, LiveReload};

/// Where a request goes.
#[derive(Debug)]
pub(crate) enum Route<'a> {
    /// Live reload event stream.
    Events(&'a LiveReload),
    /// HTML document under the root, served with the reload script.
    Document(PathBuf),
    /// Everything else, served unchanged.
    Static,
}

/// Classify a request by method and URL path.
///
/// Only `GET` requests are ever rewritten or streamed. `/` maps to the
/// default document if it exists; `*.html` paths map to existing files under
/// the root. Paths that escape the root are left to the static delegate,
/// which rejects them.
pub(crate) async fn classify<'a>(state: &'a AppState, method: &Method, path: &str) -> Route<'a> {
    if *method != Method::GET {
        return Route::Static;
    }

    if path == EVENTS_PATH {
        return state.live_reload.as_ref().map_or(Route::Static, Route::Events);
    }

    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        return Route::Static;
    };

    if decoded.is_empty() || decoded == "/" {
        let document = state.root.join(&state.default_document);
        return if is_file(&document).await {
            Route::Document(document)
        } else {
            Route::Static
        };
    }

    if decoded.ends_with(".html")
        && let Some(file) = resolve_under_root(&state.root, &decoded)
        && is_file(&file).await
    {
        return Route::Document(file);
    }

    Route::Static
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Join a URL path onto `root`, refusing anything but plain segments.
pub(crate) fn resolve_under_root(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => resolved.push(segment),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerConfig;
    use std::time::Duration;

    fn state(root: &Path, live_reload_enabled: bool) -> AppState {
        AppState::new(&ServerConfig {
            root: root.to_path_buf(),
            default_document: "punyu.html".to_owned(),
            live_reload_enabled,
            poll_interval: Duration::from_millis(500),
            ..ServerConfig::default()
        })
    }

    fn site() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("punyu.html"), "<body></body>").unwrap();
        std::fs::create_dir_all(temp_dir.path().join("docs")).unwrap();
        std::fs::write(temp_dir.path().join("docs/guide page.html"), "guide").unwrap();
        std::fs::write(temp_dir.path().join("main.js"), "").unwrap();
        std::fs::create_dir(temp_dir.path().join("archive.html")).unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_events_path() {
        let temp_dir = site();
        let state = state(temp_dir.path(), true);

        assert!(matches!(
            classify(&state, &Method::GET, "/_events").await,
            Route::Events(_)
        ));
        assert!(matches!(
            classify(&state, &Method::POST, "/_events").await,
            Route::Static
        ));
    }

    #[tokio::test]
    async fn test_events_path_without_live_reload() {
        let temp_dir = site();
        let state = state(temp_dir.path(), false);

        assert!(matches!(
            classify(&state, &Method::GET, "/_events").await,
            Route::Static
        ));
    }

    #[tokio::test]
    async fn test_root_maps_to_default_document() {
        let temp_dir = site();
        let state = state(temp_dir.path(), true);

        for path in ["/", ""] {
            match classify(&state, &Method::GET, path).await {
                Route::Document(file) => assert_eq!(file, temp_dir.path().join("punyu.html")),
                other => panic!("expected document for {path:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_root_without_default_document_is_static() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path(), true);

        assert!(matches!(
            classify(&state, &Method::GET, "/").await,
            Route::Static
        ));
    }

    #[tokio::test]
    async fn test_html_paths_are_documents() {
        let temp_dir = site();
        let state = state(temp_dir.path(), true);

        match classify(&state, &Method::GET, "/docs/guide%20page.html").await {
            Route::Document(file) => {
                assert_eq!(file, temp_dir.path().join("docs/guide page.html"));
            }
            other => panic!("expected document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_paths_are_static() {
        let temp_dir = site();
        let state = state(temp_dir.path(), true);

        for path in [
            "/main.js",
            "/docs/",
            "/missing.html",
            "/docs",
            "/archive.html",
        ] {
            assert!(
                matches!(classify(&state, &Method::GET, path).await, Route::Static),
                "{path} should be static"
            );
        }
    }

    #[tokio::test]
    async fn test_traversal_is_never_a_document() {
        let temp_dir = site();
        let nested = temp_dir.path().join("docs");
        let state = state(&nested, true);

        assert!(matches!(
            classify(&state, &Method::GET, "/../punyu.html").await,
            Route::Static
        ));
        assert!(matches!(
            classify(&state, &Method::GET, "/%2e%2e/punyu.html").await,
            Route::Static
        ));
    }

    #[test]
    fn test_resolve_under_root() {
        let root = Path::new("/srv/site");

        assert_eq!(
            resolve_under_root(root, "/a/./b.html"),
            Some(PathBuf::from("/srv/site/a/b.html"))
        );
        assert_eq!(resolve_under_root(root, "/a/../b.html"), None);
        assert_eq!(resolve_under_root(root, "/"), Some(PathBuf::from("/srv/site")));
    }
}

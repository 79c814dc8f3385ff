//! Router construction.
//!
//! Every request goes through a single fallback handler that classifies it
//! and hands it to exactly one of the event stream, the document injector
//! or the static delegate.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware;
use axum::response::Response;

use crate::inject;
use crate::live_reload;
use crate::middleware::access_log::access_log;
use crate::router::{self, Route};
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

/// Route a request to its handler.
async fn dispatch(State(state): State<Arc<AppState>>, req: Request<Body>) -> Response {
    let route = router::classify(&state, req.method(), req.uri().path()).await;
    respond(&state, route, req).await
}

/// Serve a classified request. A document that can no longer be read is
/// handed to the static delegate unchanged.
async fn respond(state: &AppState, route: Route<'_>, req: Request<Body>) -> Response {
    match route {
        Route::Events(live_reload) => live_reload::events_handler(live_reload).await,
        Route::Document(file) => {
            match inject::serve_document(&file, state.live_reload_enabled()).await {
                Some(response) => response,
                None => static_files::serve_static(state, req).await,
            }
        }
        Route::Static => static_files::serve_static(state, req).await,
    }
}

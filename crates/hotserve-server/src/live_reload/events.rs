//! Event-stream endpoint for live reload.
//!
//! Opens a session, spawns its loop as an independent task and streams the
//! session's signals to the client as server-sent events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::http::{StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use tokio::sync::mpsc;

use super::RELOAD_MESSAGE;
use super::session::{ReloadSession, ReloadSignal, SessionEnd};
use crate::state::LiveReload;

/// Handle `GET /_events`.
pub(crate) async fn events_handler(live_reload: &LiveReload) -> Response {
    let session =
        match ReloadSession::open(Arc::clone(&live_reload.tracker), live_reload.poll_interval)
            .await
        {
            Ok(session) => session,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };

    let (tx, rx) = mpsc::channel::<ReloadSignal>(1);

    tokio::spawn(async move {
        match session.run(tx).await {
            SessionEnd::Disconnected => tracing::debug!("Reload session closed by client"),
            SessionEnd::TrackerFailed => tracing::warn!("Reload session stopped"),
        }
    });

    // Dropping the body (client gone) drops `rx`, which ends the session
    let events = stream::unfold(rx, |mut rx| async move {
        let ReloadSignal = rx.recv().await?;
        Some((Ok::<_, Infallible>(reload_event()), rx))
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Sse::new(events),
    )
        .into_response()
}

/// Serializes to exactly `data: reload\n\n`.
fn reload_event() -> Event {
    Event::default().data(RELOAD_MESSAGE)
}

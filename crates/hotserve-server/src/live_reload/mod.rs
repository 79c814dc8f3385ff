//! Live reload over server-sent events.
//!
//! Every browser tab holds one `GET /_events` stream. Each stream runs its
//! own polling session and receives `data: reload` whenever a watched file
//! changes.

mod events;
mod session;

pub(crate) use events::events_handler;

/// Path of the event-stream endpoint.
pub const EVENTS_PATH: &str = "/_events";

/// Payload of a reload event.
pub const RELOAD_MESSAGE: &str = "reload";

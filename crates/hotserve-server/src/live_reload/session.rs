//! Per-connection reload session.
//!
//! A session remembers the freshness it last reported and samples the
//! tracker once per poll interval. Each session owns its own state, so two
//! browsers that connected at different times each see a change exactly once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::tracker::{ChangeTracker, Freshness};

/// Signal sent to the client whenever watched files changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReloadSignal;

/// Why a session stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// The client went away. This is how every session normally ends.
    Disconnected,
    /// The blocking sampler panicked or was cancelled.
    TrackerFailed,
}

/// Long-lived poll-and-notify loop for one event stream.
pub(crate) struct ReloadSession {
    tracker: Arc<ChangeTracker>,
    last_known: Freshness,
    interval: Duration,
}

impl ReloadSession {
    /// Open a session, recording the current freshness so that connecting
    /// never triggers a reload by itself.
    pub(crate) async fn open(
        tracker: Arc<ChangeTracker>,
        interval: Duration,
    ) -> Result<Self, SessionEnd> {
        let last_known = sample(&tracker).await?;
        tracing::debug!(
            root = %tracker.root().display(),
            freshness = last_known.as_secs_f64(),
            "Reload session opened"
        );

        Ok(Self {
            tracker,
            last_known,
            interval,
        })
    }

    /// Take one sample. Returns `true` if watched files changed since the
    /// previous sample.
    pub(crate) async fn poll(&mut self) -> Result<bool, SessionEnd> {
        let current = sample(&self.tracker).await?;
        if current > self.last_known {
            self.last_known = current;
            return Ok(true);
        }
        Ok(false)
    }

    /// Run until the client disconnects.
    ///
    /// Sends one [`ReloadSignal`] per detected change, then sleeps for the
    /// poll interval. The sleep is raced against the receiver closing, so a
    /// closed tab ends the session without waiting for the next change.
    pub(crate) async fn run(mut self, tx: mpsc::Sender<ReloadSignal>) -> SessionEnd {
        loop {
            match self.poll().await {
                Ok(true) => {
                    tracing::info!(
                        freshness = self.last_known.as_secs_f64(),
                        "Change detected, sending reload"
                    );
                    if tx.send(ReloadSignal).await.is_err() {
                        return SessionEnd::Disconnected;
                    }
                }
                Ok(false) => {}
                Err(end) => return end,
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = tx.closed() => return SessionEnd::Disconnected,
            }
        }
    }
}

/// Sample freshness on the blocking pool.
async fn sample(tracker: &Arc<ChangeTracker>) -> Result<Freshness, SessionEnd> {
    let tracker = Arc::clone(tracker);
    tokio::task::spawn_blocking(move || tracker.freshness())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Freshness sampling failed");
            SessionEnd::TrackerFailed
        })
}

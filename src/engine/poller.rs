//! Background poller.
//!
//! Periodically re-fetches the canonical list so edits made by other users
//! show up without any user action. A tick is skipped outright while a
//! mutation is syncing; a poll already in flight when a mutation starts is
//! neutralized by the engine's generation check, so no cancellation is
//! needed.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{SyncEngine, SyncStatus};

/// Handle to the polling task.
pub struct BackgroundPoller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackgroundPoller {
    /// Start polling at the engine's configured interval.
    pub fn start(engine: SyncEngine) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let interval_ms = engine.config().poll_interval_ms.max(1);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The immediate first tick: selection flows already refresh.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if engine.status() == SyncStatus::Syncing {
                            debug!("Mutation in flight, skipping background poll");
                            crate::metrics::record_operation("engine", "poll", "skipped");
                            continue;
                        }
                        // NoBasketSelected just means nothing to poll yet.
                        let _ = engine.refresh(true).await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Background poller stopped");
        });

        Self { shutdown, handle }
    }

    /// Signal the poller to stop after its current iteration.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop and wait for the polling task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::domain::ports::{CommitWatch, StoreEvent};

/// Background listener that aborts its task when dropped.
pub struct ListenerHandle(JoinHandle<()>);

impl ListenerHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs `refresh` after every change event until the feed closes.
/// A lagged receiver still triggers a refresh, since a full re-read covers the missed events.
pub fn spawn_refresh_loop<F, Fut>(
    collection: &'static str,
    mut events: broadcast::Receiver<StoreEvent>,
    mut refresh: F,
) -> ListenerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(
        async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(document_id = %event.document_id, "Store change received");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Change feed lagged by {} events; re-reading collection", skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("Change feed closed");
                        break;
                    }
                }
                refresh().await;
            }
        }
        .instrument(info_span!("live_sync", collection = collection)),
    );

    ListenerHandle(task)
}

/// Checks the store's commit counter every `interval` and runs `refresh` when it moves.
/// `baseline` is the counter read before the initial load; `None` forces one refresh.
pub fn spawn_commit_watch<F, Fut>(
    watch: Arc<dyn CommitWatch>,
    interval: Duration,
    baseline: Option<i64>,
    mut refresh: F,
) -> ListenerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(
        async move {
            let mut last = baseline;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match watch.data_version().await {
                    Ok(version) if Some(version) != last => {
                        debug!(version, "Store committed elsewhere; re-reading");
                        last = Some(version);
                        refresh().await;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Commit check failed: {}", e),
                }
            }
        }
        .instrument(info_span!("live_sync", collection = "external")),
    );

    ListenerHandle(task)
}

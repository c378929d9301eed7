//! Background maintenance task running periodic cleanup.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ports::DeduplicationApi;

/// Handle to a running maintenance task.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also stops
/// the task, but does not wait for it.
pub struct MaintenanceHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Stop the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run `cleanup()` every `interval` on the current tokio runtime.
pub fn spawn_maintenance(dedup: Arc<dyn DeduplicationApi>, interval: Duration) -> MaintenanceHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut cleanup_interval = tokio::time::interval(interval);
        cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        cleanup_interval.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = cleanup_interval.tick() => {
                    let stats = dedup.cleanup();
                    if stats.entries_removed > 0 || stats.peers_removed > 0 {
                        debug!(
                            entries_removed = stats.entries_removed,
                            peers_removed = stats.peers_removed,
                            "[p2p-dedup] Maintenance cleanup"
                        );
                    }
                }
            }
        }

        info!("[p2p-dedup] Maintenance task stopped");
    });

    MaintenanceHandle {
        shutdown_tx: Some(shutdown_tx),
        task,
    }
}

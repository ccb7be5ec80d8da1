//! Periodic background sweep
//!
//! The poller runs a sweep right away and then once per interval until it is
//! shut down. Shutdown is observed between sweeps, and inside a sweep before
//! every page fetch and every episode. The page or episode in flight is
//! always finished.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use podmirror::poller::Poller;
//! # use podmirror::sync::{SyncEngine, SyncOptions};
//! # async fn example(engine: Arc<SyncEngine>) {
//! let handle = Poller::new(engine, SyncOptions::default()).spawn();
//! // ... serve requests ...
//! handle.shutdown().await;
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::sync::{SyncEngine, SyncOptions};

/// Time between the starts of two sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration of the background sweep task
pub struct Poller {
    engine: Arc<SyncEngine>,
    options: SyncOptions,
    interval: Duration,
}

impl Poller {
    pub fn new(engine: Arc<SyncEngine>, options: SyncOptions) -> Self {
        Self {
            engine,
            options,
            interval: SWEEP_INTERVAL,
        }
    }

    /// Override the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the sweep loop on the tokio runtime
    pub fn spawn(self) -> PollerHandle {
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(shutdown.clone()));

        PollerHandle { shutdown, task }
    }

    async fn run(self, shutdown: CancellationToken) {
        info!(interval = ?self.interval, "Poller started");

        // The first tick completes immediately, so the first sweep runs on startup.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.engine.sweep(&self.options, &shutdown).await {
                Ok(result) if result.interrupted => break,
                Ok(result) => {
                    info!(
                        synced = result.synced,
                        failed = result.failed,
                        stored = result.stored,
                        "Updated shows"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to update shows");
                }
            }
        }

        info!("Poller stopped");
    }
}

/// Handle to a running poller, owned by the top-level lifecycle
pub struct PollerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal shutdown and wait for the sweep task to exit.
    ///
    /// Once this returns no sweep touches the store anymore, so the store
    /// can be closed.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Poller task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::progress::NoopReporter;
    use crate::store::{Database, EpisodeStore, Show};
    use crate::test_support::{MockCatalog, MockResolver, descriptors};

    async fn setup() -> (Arc<SyncEngine>, Arc<Database>, Arc<MockCatalog>) {
        let db = Arc::new(Database::in_memory().await.unwrap());
        db.create_show(&Show {
            id: "p1".to_string(),
            title: "Show".to_string(),
            subtitle: String::new(),
            image: String::new(),
        })
        .await
        .unwrap();

        let catalog = Arc::new(MockCatalog::default());
        let engine = Arc::new(SyncEngine::new(
            db.clone(),
            catalog.clone(),
            Arc::new(MockResolver::default()),
            NoopReporter::shared(),
        ));

        (engine, db, catalog)
    }

    #[tokio::test]
    async fn sweeps_immediately_on_start() {
        let (engine, db, catalog) = setup().await;
        catalog.set_listing("p1", descriptors(&[300, 200, 100]));

        let handle = Poller::new(engine, SyncOptions::default()).spawn();

        let mut waited = Duration::ZERO;
        while db.episodes("p1").await.unwrap().len() < 3 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        handle.shutdown().await;

        assert_eq!(db.latest_episode_timestamp("p1").await.unwrap(), 300);
        assert_eq!(catalog.page_requests("p1"), vec![1]);
    }

    #[tokio::test]
    async fn sweeps_again_after_each_interval() {
        let (engine, _db, catalog) = setup().await;

        let handle = Poller::new(engine, SyncOptions::default())
            .with_interval(Duration::from_millis(20))
            .spawn();

        let mut waited = Duration::ZERO;
        while catalog.page_requests("p1").len() < 3 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        handle.shutdown().await;

        // Every sweep fetches the single, empty first page
        let requests = catalog.page_requests("p1");
        assert!(requests.len() >= 3);
        assert!(requests.iter().all(|page| *page == 1));
    }

    #[tokio::test]
    async fn failed_sweep_keeps_poller_running() {
        let (engine, _db, catalog) = setup().await;
        catalog.fail_for("p1");

        let handle = Poller::new(engine, SyncOptions::default())
            .with_interval(Duration::from_millis(20))
            .spawn();

        let mut waited = Duration::ZERO;
        while catalog.page_requests("p1").len() < 2 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        handle.shutdown().await;

        assert!(catalog.page_requests("p1").len() >= 2);
    }

    #[tokio::test]
    async fn shutdown_joins_the_task() {
        let (engine, _db, _catalog) = setup().await;

        let handle = Poller::new(engine, SyncOptions::default()).spawn();

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("poller did not stop");
    }
}

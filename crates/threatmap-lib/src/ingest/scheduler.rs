//! Periodic background tasks: news polling and expired-record cleanup.
//!
//! Both tasks are spawned with a [`CancellationToken`] and exit promptly when
//! it fires:
//!
//! ```ignore
//! let shutdown = CancellationToken::new();
//! tokio::spawn(IngestionPoller::new(source, pipeline).run(shutdown.clone()));
//! tokio::spawn(ExpiryJanitor::new(store).run(shutdown.clone()));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{IngestOutcome, IngestionPipeline, NewsSource};
use crate::evacuation::with_timeout;
use crate::store::ThreatStore;

/// Default interval between news polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Default interval between expired-record purges.
pub const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 60;

/// Polls a [`NewsSource`] and feeds each item through the pipeline.
pub struct IngestionPoller {
    source: Arc<dyn NewsSource>,
    pipeline: Arc<IngestionPipeline>,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl IngestionPoller {
    pub fn new(source: Arc<dyn NewsSource>, pipeline: Arc<IngestionPipeline>) -> Self {
        let fetch_timeout = pipeline.timeout;
        Self {
            source,
            pipeline,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            fetch_timeout,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Fetch one item and process it. Fetch failures are logged and yield `None`.
    pub async fn poll_once(&self) -> Option<IngestOutcome> {
        match with_timeout("news", self.fetch_timeout, self.source.fetch()).await {
            Ok(item) => Some(self.pipeline.process(&item).await),
            Err(e) => {
                warn!(error = %e, "news poll failed");
                None
            }
        }
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "news ingestion starting"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("news ingestion shutting down");
                    break;
                }

                _ = interval.tick() => {
                    if let Some(outcome) = self.poll_once().await {
                        debug!(?outcome, "poll complete");
                    }
                }
            }
        }
    }
}

/// Purges expired threats from the store on a fixed interval.
pub struct ExpiryJanitor {
    store: Arc<ThreatStore>,
    interval: Duration,
}

impl ExpiryJanitor {
    pub fn new(store: Arc<ThreatStore>) -> Self {
        Self {
            store,
            interval: Duration::from_secs(DEFAULT_JANITOR_INTERVAL_SECS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "expiry janitor starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("expiry janitor shutting down");
                    break;
                }

                _ = interval.tick() => {
                    match self.store.purge_expired() {
                        Ok(0) => {}
                        Ok(removed) => info!(removed, "purged expired threats"),
                        Err(e) => warn!(error = %e, "failed to purge expired threats"),
                    }
                }
            }
        }
    }
}

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::aggregator::{Aggregator, AggregatorState};
use super::config::{ConfigError, StoreConfig};
use super::stats::{StoreCounters, StoreStats};
use super::table::AggregateTable;
use crate::data::{self, AggregateEntry, DecodeError, Submission};
use crate::ingest::{ingest_queue, Enqueue, IngestQueue};

/// Concurrent running-average store.
///
/// `submit` and `report` may be called from any number of threads. Submissions
/// are queued and folded into the table by a single background aggregator, so
/// `submit` never waits on aggregation. When the queue is full the submission
/// is dropped without telling the caller; `stats().dropped` counts these.
#[derive(Debug)]
pub struct ActionStore {
    table: Arc<AggregateTable>,
    queue: IngestQueue,
    counters: Arc<StoreCounters>,
    aggregator: Arc<Aggregator>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ActionStore {
    /// Create a store and start its aggregator. Must be called within a Tokio runtime.
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        Self::with_shutdown(config, std::future::pending())
    }

    /// Like `new`, but the aggregator also stops once `shutdown` completes.
    pub fn with_shutdown<F>(config: StoreConfig, shutdown: F) -> Result<Self, ConfigError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        config.validate()?;

        let table = Arc::new(AggregateTable::new());
        let counters = Arc::new(StoreCounters::default());
        let (queue, receiver) = ingest_queue(config.queue_size);
        let (stop_tx, stop_rx) = oneshot::channel();

        let aggregator = Arc::new(Aggregator::new(Arc::clone(&table), Arc::clone(&counters)));
        let handle = Arc::clone(&aggregator).start(receiver, stop_rx, shutdown);

        tracing::debug!(queue_size = config.queue_size, "Action store created");

        Ok(Self {
            table,
            queue,
            counters,
            aggregator,
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Decode a raw submission and queue it for aggregation.
    ///
    /// Only decode failures are reported. A full queue, or a stopped store,
    /// silently drops the submission.
    pub fn submit(&self, raw: &str) -> Result<(), DecodeError> {
        let submission = match data::decode(raw) {
            Ok(submission) => submission,
            Err(e) => {
                self.counters.record_rejected();
                tracing::debug!(error = %e, "Rejected submission");
                return Err(e);
            }
        };

        self.submit_decoded(submission);
        Ok(())
    }

    /// Queue an already-decoded submission, with the same drop policy as `submit`
    pub fn submit_decoded(&self, submission: Submission) {
        self.counters.record_submitted();

        match self.queue.enqueue(submission) {
            Enqueue::Accepted => {}
            Enqueue::Dropped => {
                let previous = self.counters.record_dropped();
                if previous == 0 || (previous + 1) % 1024 == 0 {
                    tracing::warn!(
                        dropped = previous + 1,
                        queue_size = self.queue.capacity(),
                        "Ingestion queue full, dropping submissions"
                    );
                } else {
                    tracing::debug!("Ingestion queue full, submission dropped");
                }
            }
            Enqueue::Closed => {
                self.counters.record_dropped();
                tracing::debug!("Store stopped, submission dropped");
            }
        }
    }

    /// Current averages as a JSON array of `{"action", "avg"}` objects.
    ///
    /// Reflects only submissions the aggregator has already processed. Never
    /// fails: an encode error is logged and yields an empty string.
    pub fn report(&self) -> String {
        let entries = self.entries();
        match data::encode(&entries) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode report");
                String::new()
            }
        }
    }

    /// Snapshot of the current averages, sorted by action name
    pub fn entries(&self) -> Vec<AggregateEntry> {
        self.table.snapshot()
    }

    /// Current average for a single action
    pub fn average(&self, name: &str) -> Option<i64> {
        self.table.get(name)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            submitted: self.counters.submitted(),
            rejected: self.counters.rejected(),
            dropped: self.counters.dropped(),
            aggregated: self.counters.aggregated(),
            actions: self.table.len(),
            pending: self.queue.len(),
            queue_size: self.queue.capacity(),
            running: self.aggregator.is_running(),
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.aggregator.state()
    }

    /// Stop the aggregator and wait for it to exit.
    ///
    /// Pending submissions are discarded. Calling this more than once is a no-op.
    pub async fn stop(&self) {
        let stop_tx = self.stop_tx.lock().take();
        if let Some(stop_tx) = stop_tx {
            // Err means the aggregator already exited
            let _ = stop_tx.send(());
        }

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Aggregator task failed");
            }
        }
    }
}

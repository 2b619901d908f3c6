use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use super::stats::StoreCounters;
use super::table::AggregateTable;
use crate::data::Submission;
use crate::ingest::IngestReceiver;

/// Lifecycle of the background aggregator. One-way: there is no restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Running,
    Stopped,
}

/// Background worker and sole writer of the aggregate table
#[derive(Debug)]
pub struct Aggregator {
    table: Arc<AggregateTable>,
    counters: Arc<StoreCounters>,
    running: AtomicBool,
}

impl Aggregator {
    pub fn new(table: Arc<AggregateTable>, counters: Arc<StoreCounters>) -> Self {
        Self {
            table,
            counters,
            running: AtomicBool::new(true),
        }
    }

    /// Start draining `queue` on the current Tokio runtime.
    ///
    /// The loop ends when `stop` fires (or its sender is dropped), when
    /// `shutdown` completes, or when every producer is gone. A stop request is
    /// checked before each dequeue and never waits for the queue to empty;
    /// whatever is still buffered at that point is discarded.
    pub fn start<F>(
        self: Arc<Self>,
        mut queue: IngestReceiver,
        mut stop: oneshot::Receiver<()>,
        shutdown: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            tracing::info!("Aggregator started");
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop => {
                        tracing::debug!("Aggregator received stop request");
                        break;
                    }
                    _ = &mut shutdown => {
                        tracing::debug!("Aggregator received shutdown signal");
                        break;
                    }
                    item = queue.recv() => match item {
                        Some(submission) => self.process(submission),
                        None => break,
                    }
                }
            }

            self.running.store(false, Ordering::SeqCst);
            queue.close();

            let mut discarded = 0usize;
            while queue.try_dequeue().is_some() {
                discarded += 1;
            }

            tracing::info!(discarded, "Aggregator stopped");
        })
    }

    fn process(&self, submission: Submission) {
        let avg = self.table.apply(&submission.name, submission.value);
        self.counters.record_aggregated();

        tracing::trace!(
            action = %submission.name,
            value = submission.value,
            avg,
            "Aggregated submission"
        );
    }

    pub fn state(&self) -> AggregatorState {
        if self.running.load(Ordering::SeqCst) {
            AggregatorState::Running
        } else {
            AggregatorState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == AggregatorState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ingest_queue, Enqueue};

    fn make_aggregator() -> (Arc<Aggregator>, Arc<AggregateTable>, Arc<StoreCounters>) {
        let table = Arc::new(AggregateTable::new());
        let counters = Arc::new(StoreCounters::default());
        let aggregator = Arc::new(Aggregator::new(Arc::clone(&table), Arc::clone(&counters)));
        (aggregator, table, counters)
    }

    #[tokio::test]
    async fn test_drains_in_order_until_producers_gone() {
        let (aggregator, table, counters) = make_aggregator();
        let (queue, rx) = ingest_queue(8);
        let (_stop_tx, stop_rx) = oneshot::channel();

        for v in [100, 200, 50] {
            assert_eq!(queue.enqueue(Submission::new("jump", v)), Enqueue::Accepted);
        }
        drop(queue);

        let handle = Arc::clone(&aggregator).start(rx, stop_rx, std::future::pending());
        handle.await.unwrap();

        // (100 + 200) / 2 = 150, (150 + 50) / 2 = 100
        assert_eq!(table.get("jump"), Some(100));
        assert_eq!(counters.aggregated(), 3);
        assert_eq!(aggregator.state(), AggregatorState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_does_not_drain() {
        let (aggregator, table, counters) = make_aggregator();
        let (queue, rx) = ingest_queue(8);
        let (stop_tx, stop_rx) = oneshot::channel();

        queue.enqueue(Submission::new("a", 1));
        queue.enqueue(Submission::new("a", 2));

        let handle = Arc::clone(&aggregator).start(rx, stop_rx, std::future::pending());
        assert!(aggregator.is_running());

        // The spawned task has not been polled yet on this single-threaded runtime
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(counters.aggregated(), 0);
        assert!(table.is_empty());
        assert!(queue.is_closed());
        assert_eq!(queue.enqueue(Submission::new("a", 3)), Enqueue::Closed);
    }

    #[tokio::test]
    async fn test_external_shutdown() {
        let (aggregator, _table, _counters) = make_aggregator();
        let (_queue, rx) = ingest_queue(8);
        let (_stop_tx, stop_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = Arc::clone(&aggregator).start(rx, stop_rx, async move {
            let _ = shutdown_rx.await;
        });

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(aggregator.state(), AggregatorState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_sender_dropped() {
        let (aggregator, _table, _counters) = make_aggregator();
        let (_queue, rx) = ingest_queue(8);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = Arc::clone(&aggregator).start(rx, stop_rx, std::future::pending());
        drop(stop_tx);

        handle.await.unwrap();
        assert!(!aggregator.is_running());
    }
}

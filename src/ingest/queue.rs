//! Bounded ingestion queue between submitters and the aggregator.
//!
//! Producers never block: when the buffer is full the submission is dropped.
//! FIFO order is preserved among accepted items.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::data::Submission;

/// Outcome of a non-blocking enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Accepted,
    /// Buffer full; the submission is gone
    Dropped,
    /// Consumer has shut down; the submission is gone
    Closed,
}

/// Producer half. Cheap to clone and safe to use from any thread.
#[derive(Debug, Clone)]
pub struct IngestQueue {
    tx: mpsc::Sender<Submission>,
    capacity: usize,
}

/// Consumer half, owned by the single aggregator.
#[derive(Debug)]
pub struct IngestReceiver {
    rx: mpsc::Receiver<Submission>,
}

/// Create a queue holding at most `capacity` pending submissions.
///
/// Panics if `capacity` is zero or above tokio's semaphore limit; callers
/// validate via `StoreConfig`.
pub fn ingest_queue(capacity: usize) -> (IngestQueue, IngestReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (IngestQueue { tx, capacity }, IngestReceiver { rx })
}

impl IngestQueue {
    pub fn enqueue(&self, submission: Submission) -> Enqueue {
        match self.tx.try_send(submission) {
            Ok(()) => Enqueue::Accepted,
            Err(TrySendError::Full(_)) => Enqueue::Dropped,
            Err(TrySendError::Closed(_)) => Enqueue::Closed,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of submissions currently buffered
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl IngestReceiver {
    /// Remove the oldest item if one is available right now
    pub fn try_dequeue(&mut self) -> Option<Submission> {
        match self.rx.try_recv() {
            Ok(submission) => Some(submission),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next item. Returns `None` once every producer is gone
    /// and the buffer is empty.
    pub async fn recv(&mut self) -> Option<Submission> {
        self.rx.recv().await
    }

    /// Stop accepting new items; already-buffered items stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (queue, mut rx) = ingest_queue(4);

        for i in 0..3 {
            assert_eq!(queue.enqueue(Submission::new("a", i)), Enqueue::Accepted);
        }
        assert_eq!(queue.len(), 3);

        for i in 0..3 {
            assert_eq!(rx.try_dequeue(), Some(Submission::new("a", i)));
        }
        assert_eq!(rx.try_dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops() {
        let (queue, mut rx) = ingest_queue(2);

        assert_eq!(queue.enqueue(Submission::new("a", 1)), Enqueue::Accepted);
        assert_eq!(queue.enqueue(Submission::new("a", 2)), Enqueue::Accepted);
        assert_eq!(queue.enqueue(Submission::new("a", 3)), Enqueue::Dropped);

        // Dropped items leave no trace
        assert_eq!(rx.try_dequeue(), Some(Submission::new("a", 1)));
        assert_eq!(rx.try_dequeue(), Some(Submission::new("a", 2)));
        assert_eq!(rx.try_dequeue(), None);

        // Space freed up again
        assert_eq!(queue.enqueue(Submission::new("a", 4)), Enqueue::Accepted);
        assert_eq!(rx.try_dequeue(), Some(Submission::new("a", 4)));
    }

    #[test]
    fn test_closed_queue() {
        let (queue, rx) = ingest_queue(2);
        drop(rx);

        assert!(queue.is_closed());
        assert_eq!(queue.enqueue(Submission::new("a", 1)), Enqueue::Closed);
    }

    #[test]
    fn test_concurrent_producers() {
        let (queue, mut rx) = ingest_queue(1000);

        std::thread::scope(|s| {
            for t in 0..4 {
                let queue = queue.clone();
                s.spawn(move || {
                    for i in 0..100 {
                        assert_eq!(
                            queue.enqueue(Submission::new(format!("t{}", t), i)),
                            Enqueue::Accepted
                        );
                    }
                });
            }
        });

        // Per-producer order survives interleaving
        let mut last = [-1i64; 4];
        let mut count = 0;
        while let Some(s) = rx.try_dequeue() {
            let t: usize = s.name[1..].parse().unwrap();
            assert!(s.value > last[t]);
            last[t] = s.value;
            count += 1;
        }
        assert_eq!(count, 400);
    }

    #[tokio::test]
    async fn test_recv_waits_for_item() {
        let (queue, mut rx) = ingest_queue(1);

        let producer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            queue.enqueue(Submission::new("late", 7))
        });

        assert_eq!(rx.recv().await, Some(Submission::new("late", 7)));
        assert_eq!(producer.await.unwrap(), Enqueue::Accepted);
    }
}

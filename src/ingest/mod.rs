//! Ingestion path for action submissions

pub mod queue;

pub use queue::{ingest_queue, Enqueue, IngestQueue, IngestReceiver};

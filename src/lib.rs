//! avgstore: In-Memory Running-Average Tracker
//!
//! Clients submit named actions with an integer measurement and read back the
//! current running average per action. Submissions pass through a bounded queue
//! to a single background aggregator, so submitting never waits on aggregation.
//!
//! # Semantics
//!
//! - **Decayed average**: the first value seeds an action's average; each later
//!   value `v` updates it to `floor((avg + v) / 2)`. Recent values dominate.
//! - **Best-effort ingestion**: when the queue is full a submission is dropped
//!   without an error. `ActionStore::stats` counts drops.
//! - **Possibly-stale reports**: a report reflects only what the aggregator has
//!   processed so far.
//! - **No durability**: all state lives in memory.
//!
//! # Example
//!
//! ```no_run
//! use avgstore::{ActionStore, StoreConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ActionStore::new(StoreConfig::default())?;
//!
//! store.submit(r#"{"action":"jump", "time":100}"#)?;
//! store.submit(r#"{"action":"run", "time":75}"#)?;
//! store.submit(r#"{"action":"jump", "time":200}"#)?;
//!
//! // Once aggregated, prints a tab-indented array:
//! // [
//! // 	{
//! // 		"action": "jump",
//! // 		"avg": 150
//! // 	},
//! // 	{
//! // 		"action": "run",
//! // 		"avg": 75
//! // 	}
//! // ]
//! println!("{}", store.report());
//!
//! store.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod data;
pub mod ingest;
pub mod storage;

// Re-export commonly used types
pub use data::{AggregateEntry, DecodeError, Submission};
pub use storage::{ActionStore, AggregatorState, ConfigError, StoreConfig, StoreStats};

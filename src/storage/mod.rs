pub mod aggregator;
pub mod config;
pub mod stats;
pub mod store;
pub mod table;

pub use aggregator::{Aggregator, AggregatorState};
pub use config::{ConfigError, StoreConfig, DEFAULT_QUEUE_SIZE, MAX_QUEUE_SIZE};
pub use stats::{StoreCounters, StoreStats};
pub use store::ActionStore;
pub use table::AggregateTable;

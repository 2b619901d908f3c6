/// Default capacity of the pending-submission buffer
pub const DEFAULT_QUEUE_SIZE: usize = 128;

/// Largest accepted queue capacity (16M pending submissions)
pub const MAX_QUEUE_SIZE: usize = 1 << 24;

/// Configuration for an `ActionStore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of the pending-submission buffer (default: 128)
    pub queue_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    /// Create config from environment variables
    ///
    /// - `AVGSTORE_QUEUE_SIZE`: queue capacity (default: 128, max: `MAX_QUEUE_SIZE`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("AVGSTORE_QUEUE_SIZE") {
            config.queue_size = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidQueueSize(raw))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        if self.queue_size > MAX_QUEUE_SIZE {
            return Err(ConfigError::QueueSizeTooLarge(self.queue_size));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Queue size must be at least 1")]
    ZeroQueueSize,

    #[error("Queue size {0} exceeds maximum of {max}", max = MAX_QUEUE_SIZE)]
    QueueSizeTooLarge(usize),

    #[error("Invalid queue size '{0}'")]
    InvalidQueueSize(String),
}

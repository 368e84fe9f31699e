//! Error types for the work pool and work queue

/// Result type for pool and queue operations
pub type Result<T> = std::result::Result<T, WorkqError>;

/// Errors that can occur in the pool or the queue
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WorkqError {
    /// A required setting is missing or invalid
    #[error("Invalid configuration for '{parameter}': {message}")]
    Configuration {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Backing storage could not be obtained
    #[error("Allocation failed: {message}")]
    Allocation {
        /// Error message
        message: String,
    },

    /// A queue channel could not be created or attached
    #[error("Failed to create queue (key: {key:?}, subsystem: {subsystem_id}): {message}")]
    QueueCreation {
        /// Channel key, `None` for a private channel
        key: Option<String>,
        /// Subsystem identifier
        subsystem_id: i32,
        /// Error message
        message: String,
    },

    /// Operation on a destroyed or never-valid object
    #[error("Invalid handle: {object} is not alive")]
    InvalidHandle {
        /// Kind of object the handle refers to
        object: &'static str,
    },

    /// Work item payload exceeds the configured maximum
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Offered payload size
        size: usize,
        /// Maximum payload size
        max: usize,
    },

    /// Priority outside the supported level range
    #[error("Invalid priority {priority}: must be within 1..={levels}")]
    InvalidPriority {
        /// Offered priority
        priority: u32,
        /// Number of priority levels
        levels: u32,
    },

    /// Failed to spawn a worker thread
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl WorkqError {
    /// Create a configuration error
    pub fn configuration(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        WorkqError::Configuration {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an allocation error
    pub fn allocation(message: impl Into<String>) -> Self {
        WorkqError::Allocation {
            message: message.into(),
        }
    }

    /// Create a queue creation error
    pub fn queue_creation(
        key: Option<&str>,
        subsystem_id: i32,
        message: impl Into<String>,
    ) -> Self {
        WorkqError::QueueCreation {
            key: key.map(str::to_owned),
            subsystem_id,
            message: message.into(),
        }
    }

    /// Create an invalid handle error
    pub fn invalid_handle(object: &'static str) -> Self {
        WorkqError::InvalidHandle { object }
    }

    /// Create a payload too large error
    pub fn payload_too_large(size: usize, max: usize) -> Self {
        WorkqError::PayloadTooLarge { size, max }
    }

    /// Create an invalid priority error
    pub fn invalid_priority(priority: u32, levels: u32) -> Self {
        WorkqError::InvalidPriority { priority, levels }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        WorkqError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        WorkqError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        WorkqError::Other(msg.into())
    }
}

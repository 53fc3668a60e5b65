//! Error types and status codes for the buffer broker

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, BufferHubError>;

/// Error kinds returned by the broker and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum BufferHubError {
    /// The allocator rejected the request or returned an unusable handle
    #[error("Allocation failed: {message}")]
    AllocationFailed { message: String },

    /// Token absent from the registry, or the token carrier is malformed
    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    /// Token resolved but the client that minted it no longer exists
    #[error("Buffer freed: client {client_id} is gone")]
    BufferFreed { client_id: u64 },

    /// Every consumer slot of the buffer is taken
    #[error("Buffer {buffer_id} reached the maximum of {max} clients")]
    MaxClientsReached { buffer_id: u32, max: u32 },

    /// Operation on a client that was already closed
    #[error("Client {client_id} is closed")]
    ClientClosed { client_id: u64 },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// I/O related errors (file operations, mmap, etc.)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },

    /// Configuration could not be parsed
    #[error("Config error: {message}")]
    Config { message: String },
}

/// Numeric status codes handed back to the transport layer
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferHubStatus {
    NoError = 0,
    AllocationFailed = 1,
    InvalidToken = 2,
    BufferFreed = 3,
    MaxClient = 4,
    ClientClosed = 5,
    /// Local failures with no dedicated wire code
    InternalError = 6,
}

impl BufferHubError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an allocation failure
    pub fn allocation_failed(message: impl Into<String>) -> Self {
        Self::AllocationFailed {
            message: message.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wire status code for this error
    pub fn status(&self) -> BufferHubStatus {
        match self {
            Self::AllocationFailed { .. } => BufferHubStatus::AllocationFailed,
            Self::InvalidToken { .. } => BufferHubStatus::InvalidToken,
            Self::BufferFreed { .. } => BufferHubStatus::BufferFreed,
            Self::MaxClientsReached { .. } => BufferHubStatus::MaxClient,
            Self::ClientClosed { .. } => BufferHubStatus::ClientClosed,
            Self::InvalidParameter { .. }
            | Self::Io { .. }
            | Self::Platform { .. }
            | Self::Config { .. } => BufferHubStatus::InternalError,
        }
    }
}

impl From<std::io::Error> for BufferHubError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<toml::de::Error> for BufferHubError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML error: {}", err))
    }
}

/// Collapse a broker result into the status code reported over the wire
pub fn status_of<T>(result: &Result<T>) -> BufferHubStatus {
    match result {
        Ok(_) => BufferHubStatus::NoError,
        Err(e) => e.status(),
    }
}

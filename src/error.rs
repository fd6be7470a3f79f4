//! Error handling for the robot telemetry crate.

/// A specialized `Result` type for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// The main error type for telemetry operations.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded for the wire
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sensor input could not be parsed
    #[error("Failed to parse sensor input: {0}")]
    ParseError(String),

    /// Broker connection or channel setup failed
    #[error("Broker error: {0}")]
    Broker(String),

    /// A single publish attempt failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic system error
    #[error("System error: {0}")]
    System(String),
}

impl TelemetryError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new broker error
    pub fn broker_error(msg: impl Into<String>) -> Self {
        Self::Broker(msg.into())
    }

    /// Create a new publish error
    pub fn publish_error(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new generic system error
    pub fn system_error(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }
}

impl From<lapin::Error> for TelemetryError {
    fn from(err: lapin::Error) -> Self {
        Self::Broker(err.to_string())
    }
}

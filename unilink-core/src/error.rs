use thiserror::Error;

/// Main error type for link operations
///
/// Reads never fail because a deadline elapsed: a partial or empty result is a
/// valid outcome. Only construction, connection and dial failures surface here.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Timeout")]
    Timeout,

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
}

impl LinkError {
    /// Shorthand for an [`LinkError::InvalidConfig`] built from anything printable
    pub fn invalid_config(message: impl Into<String>) -> Self {
        LinkError::InvalidConfig(message.into())
    }

    /// Whether the error means the remote device could not be reached
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, LinkError::DeviceUnavailable(_))
    }
}

/// Result type alias for link operations
pub type LinkResult<T> = Result<T, LinkError>;

//! Error types for krama-motion

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// krama-motion error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Controller used before an actuator was attached
    #[error("Controller not initialized")]
    NotInitialized,

    /// Script rejected at load time
    #[error("Invalid script: {0}")]
    InvalidScript(String),

    /// Actuator fault
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

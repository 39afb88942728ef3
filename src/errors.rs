use thiserror::Error;

/// Main crate error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading or parsing a configuration file failed.
    #[error("config file error: {0}")]
    ConfigFile(String),

    /// The command sink could not deliver an outbound command.
    #[error("command sink error: {0}")]
    Sink(String),

    /// The session has ended; no further commands can be issued.
    #[error("session disconnected")]
    Disconnected,
}

impl Error {
    /// Create a config validation error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create a sink transport error.
    pub fn sink(msg: impl Into<String>) -> Self {
        Error::Sink(msg.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

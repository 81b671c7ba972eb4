//! Error types for autoforge.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for autoforge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// PTY transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Install-level errors
    #[error("Install error: {0}")]
    Install(#[from] InstallError),
}

/// Transport layer errors (PTY allocation, child process spawning).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to allocate a PTY pair
    #[error("Failed to open PTY: {0}")]
    PtyOpen(String),

    /// Failed to launch the child process
    #[error("Failed to spawn '{command}': {message}")]
    Spawn {
        command: String,
        message: String,
    },

    /// I/O error on the PTY master
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, stream lifecycle).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The child kept producing output past the drain window
    #[error("Child output did not finish within {0:?}")]
    DrainTimeout(Duration),

    /// Stream closed before the expected pattern appeared
    #[error("Stream closed before the expected pattern")]
    Closed,

    /// Invalid regex prompt pattern
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Install layer errors (credentials, configuration).
#[derive(Error, Debug)]
pub enum InstallError {
    /// A required credential variable is absent from the environment
    #[error("Missing credential variable '{var}'")]
    MissingCredential { var: &'static str },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Failed to read the config file
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse the config file
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type alias using autoforge's Error.
pub type Result<T> = std::result::Result<T, Error>;

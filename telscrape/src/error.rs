//! Error types for telscrape.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for telscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Telnet transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Transport layer errors (TCP connection, read deadline, stream I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The read deadline armed at connect time expired
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The session was closed by the caller
    #[error("Connection closed")]
    Closed,

    /// I/O error, including end of stream in the middle of a read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern compilation).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (session lifecycle, configuration).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Operation issued in the wrong session state
    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Whether this error is the read deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Timeout(_)))
    }

    /// Whether this error means the remote side closed the stream.
    pub fn is_eof(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Transport(TransportError::Io(err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Channel(ChannelError::InvalidPattern(err))
    }
}

/// Result type alias using telscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;

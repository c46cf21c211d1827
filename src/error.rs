use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Error type for tokenizing, writing and sniffing.
///
/// The value is cheap to clone so that a sticky failure can be reported by
/// every call that follows it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// IO error while reading the source or writing the sink.
    #[error("IO error: {0}")]
    Io(Arc<io::Error>),

    /// Conflicting or unusable dialect bytes.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No dialect could be guessed (strict mode only).
    #[error("Could not detect CSV dialect: {0}")]
    NoDialectDetected(String),

    /// Empty file or no data.
    #[error("Empty file or no data to analyze")]
    EmptyData,

    /// Fetching a remote sample failed.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

#[cfg(feature = "http")]
impl From<crate::http::HttpError> for Error {
    fn from(err: crate::http::HttpError) -> Self {
        match err {
            crate::http::HttpError::Io(err) => Error::from(err),
            other => Error::Http(other.to_string()),
        }
    }
}

impl Error {
    /// Returns the kind of the underlying IO error, if this is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for trust root operations

use thiserror::Error;

/// Classification of a trust root failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or inaccessible override path or content
    Config,
    /// The trust-distribution service could not be queried
    SourceUnavailable,
    /// Malformed PEM/DER or unparsable certificate
    Parse,
    /// No trust material was resolved
    TrustNotFound,
}

/// Errors that can occur while acquiring trust material
///
/// Payloads are plain strings so a failed build can be cached and handed out
/// to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Override path or content is malformed or inaccessible
    #[error("configuration error: {0}")]
    Config(String),

    /// Trust-distribution query failure
    #[error("trust source unavailable: {0}")]
    SourceUnavailable(String),

    /// Parsing error
    #[error("failed to parse trust material: {0}")]
    Parse(String),

    /// No trust material resolved
    #[error("trust material not found: {0}")]
    TrustNotFound(String),
}

impl Error {
    /// The classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Error::Parse(_) => ErrorKind::Parse,
            Error::TrustNotFound(_) => ErrorKind::TrustNotFound,
        }
    }

    /// The message without the classification prefix
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::SourceUnavailable(msg)
            | Error::Parse(msg)
            | Error::TrustNotFound(msg) => msg,
        }
    }

    /// Prefix the message with the stage that failed, keeping the kind
    pub fn context(self, stage: impl std::fmt::Display) -> Self {
        let wrap = |msg: String| format!("{}: {}", stage, msg);
        match self {
            Error::Config(msg) => Error::Config(wrap(msg)),
            Error::SourceUnavailable(msg) => Error::SourceUnavailable(wrap(msg)),
            Error::Parse(msg) => Error::Parse(wrap(msg)),
            Error::TrustNotFound(msg) => Error::TrustNotFound(wrap(msg)),
        }
    }
}

impl From<sigstore_crypto::Error> for Error {
    fn from(e: sigstore_crypto::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result type for trust root operations
pub type Result<T> = std::result::Result<T, Error>;

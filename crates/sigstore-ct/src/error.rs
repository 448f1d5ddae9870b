//! Error types for SCT verification

use thiserror::Error;

/// Classification of an SCT verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or inaccessible override, malformed detached SCT container,
    /// or an unusable argument
    Config,
    /// The trust-distribution service could not be queried
    SourceUnavailable,
    /// Malformed PEM/DER, certificate, key or SCT record
    Parse,
    /// No log keys resolved, or the SCT's log is unknown
    TrustNotFound,
    /// SCT signature mismatch
    Verification,
    /// The certificate carries no SCT at all
    PolicyViolation,
}

/// Errors that can occur during SCT verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("trust source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("trust material not found: {0}")]
    TrustNotFound(String),

    #[error("SCT verification failed: {0}")]
    Verification(String),

    #[error("policy violation: {0}")]
    PolicyViolation(String),
}

impl Error {
    /// The classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Error::Parse(_) => ErrorKind::Parse,
            Error::TrustNotFound(_) => ErrorKind::TrustNotFound,
            Error::Verification(_) => ErrorKind::Verification,
            Error::PolicyViolation(_) => ErrorKind::PolicyViolation,
        }
    }

    /// The message without the classification prefix
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::SourceUnavailable(msg)
            | Error::Parse(msg)
            | Error::TrustNotFound(msg)
            | Error::Verification(msg)
            | Error::PolicyViolation(msg) => msg,
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
            Error::Verification(msg) => Error::Verification(wrap(msg)),
            Error::PolicyViolation(msg) => Error::PolicyViolation(wrap(msg)),
        }
    }
}

impl From<sigstore_crypto::Error> for Error {
    fn from(e: sigstore_crypto::Error) -> Self {
        match e {
            sigstore_crypto::Error::Verification(msg) => Error::Verification(msg),
            other => Error::Parse(other.to_string()),
        }
    }
}

impl From<sigstore_trust_root::Error> for Error {
    fn from(e: sigstore_trust_root::Error) -> Self {
        use sigstore_trust_root::Error as TrustError;
        match e {
            TrustError::Config(msg) => Error::Config(msg),
            TrustError::SourceUnavailable(msg) => Error::SourceUnavailable(msg),
            TrustError::Parse(msg) => Error::Parse(msg),
            TrustError::TrustNotFound(msg) => Error::TrustNotFound(msg),
        }
    }
}

/// Result type for SCT verification
pub type Result<T> = std::result::Result<T, Error>;

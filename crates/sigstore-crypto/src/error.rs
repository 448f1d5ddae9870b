//! Error types for sigstore-crypto

use thiserror::Error;

/// Failures while decoding keys and certificates or checking signatures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Key bytes that no supported encoding accepts
    #[error("invalid key: {0}")]
    InvalidKeyFormat(String),

    /// Well-formed key of an algorithm or curve that is not supported
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature did not verify under the key and scheme
    #[error("verification failed: {0}")]
    Verification(String),

    #[error("PEM error: {0}")]
    Pem(String),

    #[error("DER error: {0}")]
    Der(String),

    /// Certificate that cannot be parsed or re-encoded
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}

impl From<aws_lc_rs::error::KeyRejected> for Error {
    fn from(e: aws_lc_rs::error::KeyRejected) -> Self {
        Error::InvalidKeyFormat(e.to_string())
    }
}

impl From<der::Error> for Error {
    fn from(e: der::Error) -> Self {
        Error::Der(e.to_string())
    }
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, Error>;

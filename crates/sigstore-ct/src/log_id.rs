//! Transparency log identifiers

use std::fmt;

use sigstore_crypto::{sha256, PublicKey};

use crate::{Error, Result};

/// SHA-256 of a log's DER SubjectPublicKeyInfo (RFC 6962 section 3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogId([u8; 32]);

impl LogId {
    /// Compute the identifier of the log signing with `key`
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(sha256(key.spki_der()))
    }

    /// Read an identifier from a slice that must be exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let id: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::Parse(format!("log ID must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(id))
    }
}

impl From<[u8; 32]> for LogId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

//! Detached SCTs from a CT log add-chain response (RFC 6962 section 4.1)

use base64::Engine;
use serde::{Deserialize, Serialize};
use tls_codec::DeserializeBytes;
use x509_cert::ext::pkix::sct::DigitallySigned;

use crate::error::{Error, Result};
use crate::sct::SctRecord;
use crate::LogId;

/// JSON body returned by a log's `add-chain` endpoint
///
/// Binary fields are base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddChainResponse {
    pub sct_version: u8,
    pub id: String,
    pub timestamp: u64,
    #[serde(default)]
    pub extensions: String,
    pub signature: String,
}

impl AddChainResponse {
    /// Decode the JSON payload
    ///
    /// A payload that is not a well-formed response is a configuration
    /// error; the fields themselves are checked by
    /// [`to_sct_record`](Self::to_sct_record).
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| Error::Config(format!("unmarshal add-chain response: {}", e)))
    }

    /// Convert into an SCT record
    pub fn to_sct_record(&self) -> Result<SctRecord> {
        if self.sct_version != 0 {
            return Err(Error::Parse(format!(
                "unsupported SCT version {}",
                self.sct_version
            )));
        }

        let id = decode_field("id", &self.id)?;
        let extensions = decode_field("extensions", &self.extensions)?;
        let signature = decode_field("signature", &self.signature)?;

        let (signed, rest) = DigitallySigned::tls_deserialize_bytes(&signature)
            .map_err(|e| Error::Parse(format!("malformed SCT signature: {:?}", e)))?;
        if !rest.is_empty() {
            return Err(Error::Parse(format!(
                "{} trailing bytes after SCT signature",
                rest.len()
            )));
        }
        SctRecord::from_parts(LogId::from_slice(&id)?, self.timestamp, extensions, &signed)
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| Error::Parse(format!("invalid base64 in {}: {}", name, e)))
}

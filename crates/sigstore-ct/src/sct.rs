//! Certificate Transparency SCT (Signed Certificate Timestamp) records
//!
//! This module decodes SCTs embedded in certificates and reconstructs the
//! data a log signs, as defined by RFC 6962. An SCT is checked against one of
//! two log entries: a precertificate entry for SCTs embedded in the
//! certificate itself, or an X.509 entry for a detached SCT returned when the
//! finished certificate was submitted to the log.

use const_oid::db::rfc6962::CT_PRECERT_SCTS;
use sigstore_crypto::{sha256, subject_public_key_info_der, PublicKey, SigningScheme};
use tls_codec::{SerializeBytes, TlsByteVecU16, TlsByteVecU24, TlsSerializeBytes, TlsSize};
use x509_cert::{
    der::Encode,
    ext::pkix::{
        sct::{DigitallySigned, Version},
        SignedCertificateTimestamp, SignedCertificateTimestampList,
    },
    Certificate,
};

use crate::error::{Error, Result};
use crate::LogId;

// TLS SignatureAndHashAlgorithm constants (RFC 5246)
const ECDSA_SHA256: u16 = 0x0403;
const ECDSA_SHA384: u16 = 0x0503;
const RSA_PKCS1_SHA256: u16 = 0x0401;
const RSA_PKCS1_SHA384: u16 = 0x0501;
const RSA_PKCS1_SHA512: u16 = 0x0601;

/// SignatureType as defined in RFC 6962
#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
#[repr(u8)]
enum SignatureType {
    CertificateTimestamp = 0,
    #[allow(dead_code)]
    TreeHash = 1,
}

/// LogEntryType as defined in RFC 6962
#[derive(PartialEq, Debug)]
#[repr(u16)]
enum LogEntryType {
    X509Entry = 0,
    PrecertEntry = 1,
}

/// PreCert structure for precertificate entries
#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
struct PreCert {
    /// SHA-256 hash of the issuer's SubjectPublicKeyInfo
    issuer_key_hash: [u8; 32],
    /// The TBSCertificate with SCT extension removed
    tbs_certificate: TlsByteVecU24,
}

/// SignedEntry enum for different log entry types
#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
#[repr(u16)]
enum SignedEntry {
    #[tls_codec(discriminant = "LogEntryType::X509Entry")]
    X509Entry(TlsByteVecU24),
    #[tls_codec(discriminant = "LogEntryType::PrecertEntry")]
    PrecertEntry(PreCert),
}

/// The digitally-signed structure a log signs when issuing an SCT
#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
struct TimestampedEntry {
    version: Version,
    signature_type: SignatureType,
    timestamp: u64,
    signed_entry: SignedEntry,
    extensions: TlsByteVecU16,
}

/// The log entry an SCT vouches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A finished certificate, for detached SCTs
    X509 {
        /// DER encoding of the leaf certificate
        certificate: Vec<u8>,
    },
    /// A precertificate, for SCTs embedded in the certificate
    Precert {
        /// SHA-256 of the issuer's SubjectPublicKeyInfo
        issuer_key_hash: [u8; 32],
        /// DER TBSCertificate with the SCT list extension removed
        tbs_certificate: Vec<u8>,
    },
}

impl LogEntry {
    /// Entry for a finished certificate
    pub fn x509(cert: &Certificate) -> Result<Self> {
        let certificate = cert
            .to_der()
            .map_err(|e| Error::Parse(format!("failed to encode certificate: {}", e)))?;
        Ok(LogEntry::X509 { certificate })
    }

    /// Entry for the precertificate `cert` was issued from
    ///
    /// The precertificate TBS is reconstructed by removing the SCT list
    /// extension from the leaf.
    pub fn precert(cert: &Certificate, issuer: &Certificate) -> Result<Self> {
        let mut tbs_precert = cert.tbs_certificate.clone();
        tbs_precert.extensions = tbs_precert.extensions.map(|exts| {
            exts.iter()
                .filter(|ext| ext.extn_id != CT_PRECERT_SCTS)
                .cloned()
                .collect()
        });

        let mut tbs_certificate = Vec::new();
        tbs_precert
            .encode_to_vec(&mut tbs_certificate)
            .map_err(|e| Error::Parse(format!("failed to encode precert TBS: {}", e)))?;

        let issuer_spki = subject_public_key_info_der(issuer)?;
        Ok(LogEntry::Precert {
            issuer_key_hash: sha256(&issuer_spki),
            tbs_certificate,
        })
    }

    fn signed_entry(&self) -> SignedEntry {
        match self {
            LogEntry::X509 { certificate } => SignedEntry::X509Entry(certificate.as_slice().into()),
            LogEntry::Precert {
                issuer_key_hash,
                tbs_certificate,
            } => SignedEntry::PrecertEntry(PreCert {
                issuer_key_hash: *issuer_key_hash,
                tbs_certificate: tbs_certificate.as_slice().into(),
            }),
        }
    }
}

/// A decoded v1 SCT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SctRecord {
    /// Identifier of the log that issued the SCT
    pub log_id: LogId,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Opaque CT extensions
    pub extensions: Vec<u8>,
    /// TLS SignatureAndHashAlgorithm code
    pub signature_algorithm: u16,
    /// Raw signature bytes
    pub signature: Vec<u8>,
}

impl SctRecord {
    /// Convert an SCT parsed from a certificate's SCT list
    pub fn from_embedded(sct: &SignedCertificateTimestamp) -> Result<Self> {
        Self::from_parts(
            LogId::from(sct.log_id.key_id),
            sct.timestamp,
            sct.extensions.as_slice().to_vec(),
            &sct.signature,
        )
    }

    pub(crate) fn from_parts(
        log_id: LogId,
        timestamp: u64,
        extensions: Vec<u8>,
        signed: &DigitallySigned,
    ) -> Result<Self> {
        let alg = signed
            .algorithm
            .tls_serialize()
            .map_err(|e| Error::Parse(format!("failed to serialize signature algorithm: {}", e)))?;
        let signature_algorithm = match alg.as_slice() {
            [hash, sig] => u16::from_be_bytes([*hash, *sig]),
            _ => {
                return Err(Error::Parse(
                    "malformed SCT signature algorithm".to_string(),
                ))
            }
        };

        Ok(SctRecord {
            log_id,
            timestamp,
            extensions,
            signature_algorithm,
            signature: signed.signature.as_slice().to_vec(),
        })
    }

    /// Reconstruct the bytes the log signed for `entry`
    pub fn signed_data(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        TimestampedEntry {
            version: Version::V1,
            signature_type: SignatureType::CertificateTimestamp,
            timestamp: self.timestamp,
            signed_entry: entry.signed_entry(),
            extensions: self.extensions.as_slice().into(),
        }
        .tls_serialize()
        .map_err(|e| Error::Parse(format!("failed to serialize SCT data: {}", e)))
    }

    /// Verify this SCT over `entry` with the log's public key
    pub fn verify(&self, public_key: &PublicKey, entry: &LogEntry) -> Result<()> {
        let scheme = signing_scheme(self.signature_algorithm)?;
        let signed_data = self.signed_data(entry)?;
        public_key
            .verify(&signed_data, &self.signature, scheme)
            .map_err(|e| Error::Verification(format!("SCT signature verification failed: {}", e)))
    }
}

/// Map a TLS signature algorithm code to a verification scheme
fn signing_scheme(sig_alg: u16) -> Result<SigningScheme> {
    match sig_alg {
        ECDSA_SHA256 => Ok(SigningScheme::EcdsaP256Sha256),
        ECDSA_SHA384 => Ok(SigningScheme::EcdsaP384Sha384),
        RSA_PKCS1_SHA256 => Ok(SigningScheme::RsaPkcs1Sha256),
        RSA_PKCS1_SHA384 => Ok(SigningScheme::RsaPkcs1Sha384),
        RSA_PKCS1_SHA512 => Ok(SigningScheme::RsaPkcs1Sha512),
        _ => Err(Error::Verification(format!(
            "unsupported SCT signature algorithm: 0x{:04x}",
            sig_alg
        ))),
    }
}

/// Extract every SCT embedded in the certificate's SCT list extension
///
/// A certificate without the extension yields an empty list.
pub fn embedded_scts(cert: &Certificate) -> Result<Vec<SctRecord>> {
    let scts: SignedCertificateTimestampList = match cert.tbs_certificate.get() {
        Ok(Some((_, ext))) => ext,
        Ok(None) => return Ok(Vec::new()),
        Err(e) => {
            return Err(Error::Parse(format!(
                "malformed SCT list extension: {}",
                e
            )))
        }
    };

    let timestamps = scts
        .parse_timestamps()
        .map_err(|e| Error::Parse(format!("failed to parse SCT list: {:?}", e)))?;

    timestamps
        .iter()
        .map(|serialized| {
            let sct = serialized
                .parse_timestamp()
                .map_err(|e| Error::Parse(format!("failed to parse SCT: {:?}", e)))?;
            SctRecord::from_embedded(&sct)
        })
        .collect()
}

//! X.509 certificate utilities
//!
//! PEM/DER conversion helpers for certificates handed around as trust
//! material. Only `CERTIFICATE` PEM blocks are considered.

use crate::error::{Error, Result};
use rustls_pki_types::CertificateDer;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Parse a DER-encoded certificate
pub fn parse_certificate(cert_der: &[u8]) -> Result<Certificate> {
    Certificate::from_der(cert_der)
        .map_err(|e| Error::InvalidCertificate(format!("failed to parse certificate: {}", e)))
}

/// Parse every certificate in a PEM bundle
///
/// Non-certificate blocks are skipped. A bundle without any certificate is an
/// error, as is any certificate block that does not parse.
pub fn certificates_from_pem(input: &[u8]) -> Result<Vec<Certificate>> {
    let blocks = pem::parse_many(input)
        .map_err(|e| Error::Pem(format!("failed to decode PEM: {}", e)))?;

    let certs = blocks
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(|block| parse_certificate(block.contents()))
        .collect::<Result<Vec<_>>>()?;

    if certs.is_empty() {
        return Err(Error::Pem("no certificates found in PEM".to_string()));
    }

    Ok(certs)
}

/// Parse the first certificate of a PEM bundle
pub fn certificate_from_pem(input: &[u8]) -> Result<Certificate> {
    let block = pem::parse_many(input)
        .map_err(|e| Error::Pem(format!("failed to decode PEM: {}", e)))?
        .into_iter()
        .find(|block| block.tag() == CERTIFICATE_TAG)
        .ok_or_else(|| Error::Pem("no certificate found in PEM".to_string()))?;

    parse_certificate(block.contents())
}

/// Encode certificates as a concatenated PEM bundle
pub fn certificates_to_pem(certs: &[CertificateDer<'_>]) -> String {
    let blocks: Vec<pem::Pem> = certs
        .iter()
        .map(|cert| pem::Pem::new(CERTIFICATE_TAG, cert.as_ref().to_vec()))
        .collect();
    pem::encode_many(&blocks)
}

/// DER encoding of the certificate's SubjectPublicKeyInfo
pub fn subject_public_key_info_der(cert: &Certificate) -> Result<Vec<u8>> {
    cert.tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::InvalidCertificate(format!("failed to encode SPKI: {}", e)))
}

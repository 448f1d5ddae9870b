//! Deduplicating certificate pools

use rustls_pki_types::{CertificateDer, TrustAnchor};
use x509_cert::der::Encode;
use x509_cert::Certificate;

use crate::{Error, Result};

/// Whether a certificate anchors trust or sits between an anchor and a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateClass {
    /// Subject equals issuer
    Root,
    /// Anything else
    Intermediate,
}

/// Classify a certificate by comparing its raw subject and issuer names
///
/// Only the encoded names are compared. The self-signature is not checked.
pub fn classify(cert: &Certificate) -> CertificateClass {
    let tbs = &cert.tbs_certificate;
    match (tbs.subject.to_der(), tbs.issuer.to_der()) {
        (Ok(subject), Ok(issuer)) if subject == issuer => CertificateClass::Root,
        _ => CertificateClass::Intermediate,
    }
}

/// An ordered set of DER certificates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificatePool {
    certs: Vec<CertificateDer<'static>>,
}

impl CertificatePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a DER certificate, returning false if it was already present
    pub fn add(&mut self, cert: CertificateDer<'static>) -> bool {
        if self.contains(&cert) {
            return false;
        }
        self.certs.push(cert);
        true
    }

    /// Encode and add a parsed certificate
    pub fn add_certificate(&mut self, cert: &Certificate) -> Result<bool> {
        let der = cert
            .to_der()
            .map_err(|e| Error::Parse(format!("failed to encode certificate: {}", e)))?;
        Ok(self.add(CertificateDer::from(der)))
    }

    /// Whether the pool holds this exact certificate
    pub fn contains(&self, cert: &CertificateDer<'_>) -> bool {
        self.certs.iter().any(|c| c.as_ref() == cert.as_ref())
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.certs.iter()
    }

    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certs
    }

    /// Convert the pool into webpki trust anchors for chain building
    pub fn trust_anchors(&self) -> Result<Vec<TrustAnchor<'static>>> {
        self.certs
            .iter()
            .map(|cert| {
                webpki::anchor_from_trusted_cert(cert)
                    .map(|anchor| anchor.to_owned())
                    .map_err(|e| Error::Parse(format!("invalid trust anchor: {:?}", e)))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a CertificatePool {
    type Item = &'a CertificateDer<'static>;
    type IntoIter = std::slice::Iter<'a, CertificateDer<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.certs.iter()
    }
}

//! SCT verification for Fulcio-issued certificates
//!
//! An SCT is a log's signed promise that a certificate was added to a public
//! append-only log. Fulcio embeds SCTs in the certificates it issues; older
//! deployments instead return a detached SCT next to the certificate.
//!
//! By default the CT log keys come from TUF. For testing, the
//! `SIGSTORE_CT_LOG_PUBLIC_KEY_FILE` environment variable can name a PEM or
//! DER key file that replaces them.

use std::sync::Arc;

use rustls_pki_types::CertificateDer;
use sigstore_crypto::{
    certificate_from_pem, certificates_from_pem, certificates_to_pem, parse_certificate,
};
use sigstore_trust_root::{
    FetchContext, StatusKind, TrustSourceResolver, TufDistribution, CT_LOG_PUBLIC_KEY_FILE_ENV,
};
use tracing::{debug, info};
use x509_cert::der::Encode;
use x509_cert::Certificate;

use crate::add_chain::AddChainResponse;
use crate::advisory::{Advisory, SctMode};
use crate::error::{Error, Result};
use crate::registry::{LogKeyEntry, LogKeyRegistry};
use crate::sct::{embedded_scts, LogEntry, SctRecord};

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SctVerification {
    /// Which SCTs were checked
    pub mode: SctMode,
    /// Number of SCTs whose signatures verified
    pub verified: usize,
    /// Non-fatal notices raised along the way
    pub advisories: Vec<Advisory>,
}

/// Verifies SCTs against CT log keys from a configurable source
#[derive(Debug, Clone)]
pub struct SctVerifier {
    resolver: TrustSourceResolver,
}

impl SctVerifier {
    /// Create a verifier whose log keys come from `resolver`
    pub fn new(resolver: TrustSourceResolver) -> Self {
        Self { resolver }
    }

    /// Create a verifier honoring `SIGSTORE_CT_LOG_PUBLIC_KEY_FILE`, falling
    /// back to TUF
    pub fn from_env() -> Self {
        Self::new(TrustSourceResolver::from_env(
            CT_LOG_PUBLIC_KEY_FILE_ENV,
            Arc::new(TufDistribution::from_env()),
        ))
    }

    /// Verify the SCTs for `cert_pem`
    ///
    /// SCTs embedded in the certificate take priority, and every one of them
    /// must verify against the issuer in `chain_pem[0]`. Only when none are
    /// embedded is `detached_sct` (an add-chain response) checked against the
    /// certificate alone.
    pub async fn verify_sct(
        &self,
        ctx: &FetchContext,
        cert_pem: &[u8],
        chain_pem: &[u8],
        detached_sct: &[u8],
    ) -> Result<SctVerification> {
        let mut registry = LogKeyRegistry::build(&self.resolver, *ctx).await?;
        let mut advisories = registry.take_advisories();

        let cert = certificate_from_pem(cert_pem)
            .map_err(|e| Error::Parse(format!("error parsing certificate: {}", e)))?;
        let chain = certificates_from_pem(chain_pem)
            .map_err(|e| Error::Parse(format!("no certificate chain found: {}", e)))?;
        let issuer = chain
            .first()
            .ok_or_else(|| Error::Parse("no certificate chain found".into()))?;

        let embedded = embedded_scts(&cert)?;
        if !embedded.is_empty() {
            if !detached_sct.is_empty() {
                debug!("certificate carries embedded SCTs, ignoring detached SCT");
            }
            let entry = LogEntry::precert(&cert, issuer)?;
            for sct in &embedded {
                let key = lookup(&registry, sct, "ctfe public key not found for embedded SCT")?;
                sct.verify(&key.key, &entry)
                    .map_err(|e| e.context("error verifying embedded SCT"))?;
                note_expired(key, sct, SctMode::Embedded, &mut advisories);
            }
            return Ok(SctVerification {
                mode: SctMode::Embedded,
                verified: embedded.len(),
                advisories,
            });
        }

        if detached_sct.is_empty() {
            return Err(Error::PolicyViolation("no SCT found".into()));
        }

        let sct = AddChainResponse::from_json(detached_sct)?.to_sct_record()?;
        let key = lookup(&registry, &sct, "ctfe public key not found")?;
        let entry = LogEntry::x509(&cert)?;
        sct.verify(&key.key, &entry)
            .map_err(|e| e.context("error verifying SCT"))?;
        note_expired(key, &sct, SctMode::Detached, &mut advisories);

        Ok(SctVerification {
            mode: SctMode::Detached,
            verified: 1,
            advisories,
        })
    }

    /// Verify the embedded SCTs of `chain[0]`, issued by `chain[1]`
    pub async fn verify_embedded_sct(
        &self,
        ctx: &FetchContext,
        chain: &[Certificate],
    ) -> Result<SctVerification> {
        if chain.len() < 2 {
            return Err(Error::Config(
                "certificate chain must contain at least a certificate and its issuer".into(),
            ));
        }
        let ders = chain
            .iter()
            .map(|cert| cert.to_der().map(CertificateDer::from))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Parse(format!("failed to encode certificate: {}", e)))?;

        let cert_pem = certificates_to_pem(&ders[..1]);
        let chain_pem = certificates_to_pem(&ders[1..]);
        self.verify_sct(ctx, cert_pem.as_bytes(), chain_pem.as_bytes(), &[])
            .await
    }
}

fn lookup<'a>(
    registry: &'a LogKeyRegistry,
    sct: &SctRecord,
    missing: &str,
) -> Result<&'a LogKeyEntry> {
    registry
        .get(&sct.log_id)
        .ok_or_else(|| Error::TrustNotFound(format!("{} (log ID {})", missing, sct.log_id)))
}

fn note_expired(
    key: &LogKeyEntry,
    sct: &SctRecord,
    mode: SctMode,
    advisories: &mut Vec<Advisory>,
) {
    if key.status == StatusKind::Active {
        return;
    }
    let advisory = Advisory::ExpiredLogKey {
        log_id: sct.log_id,
        mode,
    };
    info!("{}", advisory);
    advisories.push(advisory);
}

/// Verify SCTs for `cert_pem` using keys configured from the environment
pub async fn verify_sct(
    ctx: &FetchContext,
    cert_pem: &[u8],
    chain_pem: &[u8],
    detached_sct: &[u8],
) -> Result<SctVerification> {
    SctVerifier::from_env()
        .verify_sct(ctx, cert_pem, chain_pem, detached_sct)
        .await
}

/// Verify the embedded SCTs of a leaf-first chain using keys configured from
/// the environment
pub async fn verify_embedded_sct(
    ctx: &FetchContext,
    chain: &[Certificate],
) -> Result<SctVerification> {
    SctVerifier::from_env()
        .verify_embedded_sct(ctx, chain)
        .await
}

/// Whether the certificate (DER or PEM) carries embedded SCTs
///
/// No SCT is verified.
pub fn contains_sct(cert: &[u8]) -> Result<bool> {
    let cert = match certificate_from_pem(cert) {
        Ok(cert) => cert,
        Err(_) => parse_certificate(cert)?,
    };
    Ok(!embedded_scts(&cert)?.is_empty())
}

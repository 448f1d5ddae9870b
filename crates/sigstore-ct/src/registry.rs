//! Transparency log public keys, keyed by log ID
//!
//! A registry is resolved from scratch for every verification and dropped
//! afterwards.

use std::collections::HashMap;
use std::path::Path;

use sigstore_crypto::{parse_alternate_public_key, PublicKey};
use sigstore_trust_root::{
    FetchContext, Role, StatusKind, TrustDistribution, TrustSource, TrustSourceResolver,
};
use tracing::{debug, warn};

use crate::advisory::Advisory;
use crate::error::{Error, Result};
use crate::LogId;

/// CT log public key target
pub const CTFE_TARGET: &str = "ctfe.pub";

/// A log key and its lifecycle status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogKeyEntry {
    pub key: PublicKey,
    pub status: StatusKind,
}

/// Map from log ID to the key that verifies that log's SCTs
#[derive(Debug, Clone, Default)]
pub struct LogKeyRegistry {
    entries: HashMap<LogId, LogKeyEntry>,
    advisories: Vec<Advisory>,
}

impl LogKeyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve log keys from whichever source `resolver` selects
    ///
    /// Fails with [`Error::TrustNotFound`] when no key was resolved.
    pub async fn build(resolver: &TrustSourceResolver, ctx: FetchContext) -> Result<Self> {
        let registry = match resolver.resolve() {
            TrustSource::LocalOverride(path) => Self::from_override(&path).await?,
            TrustSource::RemoteDistribution(distribution) => {
                Self::from_distribution(distribution.as_ref(), ctx).await?
            }
        };
        if registry.is_empty() {
            return Err(Error::TrustNotFound(
                "none of the CTFE keys have been found".into(),
            ));
        }
        debug!("resolved {} CT log keys", registry.len());
        Ok(registry)
    }

    async fn from_override(path: &Path) -> Result<Self> {
        warn!(
            "using a non-standard public key for verifying SCT: {}",
            path.display()
        );
        let raw = tokio::fs::read(path).await.map_err(|e| {
            Error::Config(format!(
                "error reading alternate public key file {}: {}",
                path.display(),
                e
            ))
        })?;
        let key = parse_alternate_public_key(&raw).map_err(|e| {
            Error::Parse(format!(
                "error parsing alternate public key from the file: {}",
                e
            ))
        })?;

        let mut registry = Self::new();
        registry.insert(key, StatusKind::Active);
        registry.advisories.push(Advisory::NonStandardLogKey {
            path: path.to_path_buf(),
        });
        Ok(registry)
    }

    async fn from_distribution(
        distribution: &dyn TrustDistribution,
        ctx: FetchContext,
    ) -> Result<Self> {
        let client = distribution.connect(ctx).await?;
        let targets = client
            .get_targets_by_meta(ctx, Role::Ctfe, &[CTFE_TARGET])
            .await?;

        let mut registry = Self::new();
        for target in &targets {
            let key = PublicKey::from_pem(&target.bytes).map_err(|e| {
                Error::Parse(format!("error parsing CT log key {}: {}", target.name, e))
            })?;
            if !key.is_ecdsa() {
                return Err(Error::Parse(format!(
                    "invalid public key in {}: was {}, require ECDSA",
                    target.name,
                    key.algorithm()
                )));
            }
            let log_id = registry.insert(key, target.status);
            debug!("CT log key {} ({}) from {}", log_id, target.status, target.name);
        }
        Ok(registry)
    }

    /// Insert `key`, replacing any entry for the same log
    pub fn insert(&mut self, key: PublicKey, status: StatusKind) -> LogId {
        let log_id = LogId::from_public_key(&key);
        self.entries.insert(log_id, LogKeyEntry { key, status });
        log_id
    }

    pub fn get(&self, log_id: &LogId) -> Option<&LogKeyEntry> {
        self.entries.get(log_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advisories raised while resolving the keys
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub(crate) fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }
}

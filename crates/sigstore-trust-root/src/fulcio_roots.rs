//! Fulcio root and intermediate certificate pools
//!
//! The pools are built once per [`TrustRootStore`] from either a local PEM
//! override or the trust distribution, then handed out to every caller. A
//! failed build is cached too, so every later caller sees the same error.
//! The build is shared between callers and survives any of them being
//! dropped, so a cancelled caller never causes a second build.
//!
//! ```no_run
//! use sigstore_trust_root::{get_intermediates, get_roots, FetchContext};
//!
//! # async fn example() -> Result<(), sigstore_trust_root::Error> {
//! let ctx = FetchContext::background();
//! let roots = get_roots(&ctx).await?;
//! let intermediates = get_intermediates(&ctx).await?;
//! println!("{} roots, {} intermediates", roots.len(), intermediates.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::{Arc, OnceLock};

use futures::future::{BoxFuture, FutureExt, Shared};
use sigstore_crypto::certificates_from_pem;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use x509_cert::Certificate;

use crate::pool::{classify, CertificateClass, CertificatePool};
use crate::source::{TrustSource, TrustSourceResolver, ROOT_FILE_ENV};
use crate::target::{FetchContext, Role, TrustDistribution};
use crate::tuf::TufDistribution;
use crate::{Error, Result};

/// Current Fulcio root target
pub const FULCIO_TARGET: &str = "fulcio.crt.pem";

/// First-generation Fulcio root target
pub const FULCIO_V1_TARGET: &str = "fulcio_v1.crt.pem";

/// Intermediate issued under the first-generation root. It is not part of the
/// distributed targets but is still needed to build chains for certificates
/// issued under it.
const FULCIO_INTERMEDIATE_V1: &str = include_str!("fulcio_intermediate_v1.crt.pem");

/// Root and intermediate pools built together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustPools {
    /// Self-issued certificates
    pub roots: CertificatePool,
    /// Everything else
    pub intermediates: CertificatePool,
}

impl TrustPools {
    fn add_classified(&mut self, certs: &[Certificate]) -> Result<()> {
        for cert in certs {
            match classify(cert) {
                CertificateClass::Root => self.roots.add_certificate(cert)?,
                CertificateClass::Intermediate => self.intermediates.add_certificate(cert)?,
            };
        }
        Ok(())
    }
}

type PoolsBuild = Shared<BoxFuture<'static, Result<TrustPools>>>;

/// Build-once store of Fulcio trust pools
pub struct TrustRootStore {
    resolver: TrustSourceResolver,
    build: OnceLock<PoolsBuild>,
    pools: OnceCell<Result<TrustPools>>,
}

impl std::fmt::Debug for TrustRootStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustRootStore")
            .field("resolver", &self.resolver)
            .field("initialized", &self.pools.initialized())
            .finish()
    }
}

impl TrustRootStore {
    /// Create a store that builds its pools from `resolver`
    pub fn new(resolver: TrustSourceResolver) -> Self {
        Self {
            resolver,
            build: OnceLock::new(),
            pools: OnceCell::new(),
        }
    }

    /// Create a store honoring `SIGSTORE_ROOT_FILE`, falling back to TUF
    pub fn from_env() -> Self {
        Self::new(TrustSourceResolver::from_env(
            ROOT_FILE_ENV,
            Arc::new(TufDistribution::from_env()),
        ))
    }

    /// Both pools, building them on first use
    ///
    /// The first caller's context bounds the build. Callers arriving while it
    /// runs wait on the same build.
    pub async fn pools(&self, ctx: &FetchContext) -> Result<&TrustPools> {
        self.pools
            .get_or_init(|| self.shared_build(*ctx))
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    fn shared_build(&self, ctx: FetchContext) -> PoolsBuild {
        self.build
            .get_or_init(|| build(self.resolver.clone(), ctx).boxed().shared())
            .clone()
    }

    /// The root pool
    pub async fn roots(&self, ctx: &FetchContext) -> Result<&CertificatePool> {
        Ok(&self.pools(ctx).await?.roots)
    }

    /// The intermediate pool
    pub async fn intermediates(&self, ctx: &FetchContext) -> Result<&CertificatePool> {
        Ok(&self.pools(ctx).await?.intermediates)
    }
}

async fn build(resolver: TrustSourceResolver, ctx: FetchContext) -> Result<TrustPools> {
    let result = match resolver.resolve() {
        TrustSource::LocalOverride(path) => load_override(&path).await,
        TrustSource::RemoteDistribution(distribution) => {
            load_remote(distribution.as_ref(), ctx).await
        }
    };
    match &result {
        Ok(pools) => {
            if pools.roots.is_empty() {
                warn!("no Fulcio root certificates were found");
            }
            debug!(
                "built Fulcio trust pools: {} roots, {} intermediates",
                pools.roots.len(),
                pools.intermediates.len()
            );
        }
        Err(e) => warn!("failed to build Fulcio trust pools: {}", e),
    }
    result
}

async fn load_override(path: &Path) -> Result<TrustPools> {
    debug!("loading Fulcio roots from {}", path.display());
    let raw = tokio::fs::read(path).await.map_err(|e| {
        Error::Config(format!("error reading root PEM file {}: {}", path.display(), e))
    })?;
    let certs = certificates_from_pem(&raw)
        .map_err(|e| Error::Parse(format!("error unmarshalling certificates: {}", e)))?;

    let mut pools = TrustPools::default();
    pools.add_classified(&certs)?;
    Ok(pools)
}

async fn load_remote(
    distribution: &dyn TrustDistribution,
    ctx: FetchContext,
) -> Result<TrustPools> {
    let client = distribution
        .connect(ctx)
        .await
        .map_err(|e| e.context("initializing trust distribution"))?;
    let targets = client
        .get_targets_by_meta(ctx, Role::Fulcio, &[FULCIO_TARGET, FULCIO_V1_TARGET])
        .await
        .map_err(|e| e.context("error getting targets"))?;
    if targets.is_empty() {
        return Err(Error::TrustNotFound(
            "none of the Fulcio roots have been found".into(),
        ));
    }

    let mut pools = TrustPools::default();
    for target in &targets {
        let certs = certificates_from_pem(&target.bytes).map_err(|e| {
            Error::Parse(format!(
                "error unmarshalling certificates from {}: {}",
                target.name, e
            ))
        })?;
        pools.add_classified(&certs)?;
    }

    let legacy = certificates_from_pem(FULCIO_INTERMEDIATE_V1.as_bytes())?;
    for cert in &legacy {
        pools.intermediates.add_certificate(cert)?;
    }
    Ok(pools)
}

static DEFAULT_STORE: OnceLock<TrustRootStore> = OnceLock::new();

/// The process-wide store, configured from the environment
pub fn default_store() -> &'static TrustRootStore {
    DEFAULT_STORE.get_or_init(TrustRootStore::from_env)
}

/// Fulcio root pool from the process-wide store
pub async fn get_roots(ctx: &FetchContext) -> Result<&'static CertificatePool> {
    default_store().roots(ctx).await
}

/// Fulcio intermediate pool from the process-wide store
pub async fn get_intermediates(ctx: &FetchContext) -> Result<&'static CertificatePool> {
    default_store().intermediates(ctx).await
}

/// The embedded first-generation intermediate
pub fn legacy_intermediate() -> Result<Certificate> {
    Ok(sigstore_crypto::certificate_from_pem(FULCIO_INTERMEDIATE_V1.as_bytes())?)
}

//! Fulcio trust root acquisition
//!
//! This crate assembles the certificate pools used to verify Fulcio-issued
//! signing certificates:
//! - Root certificates (self-issued) anchor trust
//! - Intermediate certificates are used for chain building
//!
//! Trust material comes from a local PEM file named by `SIGSTORE_ROOT_FILE`
//! when set, and from Sigstore's TUF repository otherwise. The same source
//! selection and distribution contract are shared with the certificate
//! transparency log key registry in `sigstore-ct`.
//!
//! # Example
//!
//! ```no_run
//! use sigstore_trust_root::{FetchContext, TrustRootStore, TrustSourceResolver};
//!
//! # async fn example() -> Result<(), sigstore_trust_root::Error> {
//! let store = TrustRootStore::new(TrustSourceResolver::local("/etc/sigstore/fulcio.pem"));
//! let roots = store.roots(&FetchContext::background()).await?;
//! let anchors = roots.trust_anchors()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fulcio_roots;
pub mod pool;
pub mod source;
pub mod target;
pub mod tuf;

pub use error::{Error, ErrorKind, Result};
pub use fulcio_roots::{
    default_store, get_intermediates, get_roots, legacy_intermediate, TrustPools, TrustRootStore,
    FULCIO_TARGET, FULCIO_V1_TARGET,
};
pub use pool::{classify, CertificateClass, CertificatePool};
pub use source::{TrustSource, TrustSourceResolver, CT_LOG_PUBLIC_KEY_FILE_ENV, ROOT_FILE_ENV};
pub use target::{
    BoxFuture, FetchContext, Role, StatusKind, Target, TargetClient, TrustDistribution,
};
pub use tuf::{TufConfig, TufDistribution, DEFAULT_MIRROR, TUF_ROOT_ENV};

//! Selection between a local override file and the remote distribution

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::target::TrustDistribution;

/// Environment variable naming a PEM file that replaces the Fulcio roots
pub const ROOT_FILE_ENV: &str = "SIGSTORE_ROOT_FILE";

/// Environment variable naming a public key file that replaces the CT log keys
pub const CT_LOG_PUBLIC_KEY_FILE_ENV: &str = "SIGSTORE_CT_LOG_PUBLIC_KEY_FILE";

/// Where trust material comes from
#[derive(Clone)]
pub enum TrustSource {
    /// A local file supplied by the operator
    LocalOverride(PathBuf),
    /// The signed trust-distribution service
    RemoteDistribution(Arc<dyn TrustDistribution>),
}

impl fmt::Debug for TrustSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustSource::LocalOverride(path) => {
                f.debug_tuple("LocalOverride").field(path).finish()
            }
            TrustSource::RemoteDistribution(_) => f.write_str("RemoteDistribution"),
        }
    }
}

#[derive(Clone)]
enum Selection {
    Env {
        var: &'static str,
        distribution: Arc<dyn TrustDistribution>,
    },
    Fixed(TrustSource),
}

/// Decides which [`TrustSource`] applies
///
/// An environment-driven resolver reads its variable on every call to
/// [`resolve`](Self::resolve). A non-empty value selects the local override.
#[derive(Clone)]
pub struct TrustSourceResolver {
    selection: Selection,
}

impl fmt::Debug for TrustSourceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selection {
            Selection::Env { var, .. } => f
                .debug_struct("TrustSourceResolver")
                .field("env", var)
                .finish(),
            Selection::Fixed(source) => f
                .debug_struct("TrustSourceResolver")
                .field("source", source)
                .finish(),
        }
    }
}

impl TrustSourceResolver {
    /// Use the file named by `var` when set, `distribution` otherwise
    pub fn from_env(var: &'static str, distribution: Arc<dyn TrustDistribution>) -> Self {
        Self {
            selection: Selection::Env { var, distribution },
        }
    }

    /// Always use the local file at `path`
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::fixed(TrustSource::LocalOverride(path.into()))
    }

    /// Always use `distribution`
    pub fn remote(distribution: Arc<dyn TrustDistribution>) -> Self {
        Self::fixed(TrustSource::RemoteDistribution(distribution))
    }

    /// Always use `source`
    pub fn fixed(source: TrustSource) -> Self {
        Self {
            selection: Selection::Fixed(source),
        }
    }

    /// Pick the source for this call
    pub fn resolve(&self) -> TrustSource {
        match &self.selection {
            Selection::Fixed(source) => source.clone(),
            Selection::Env { var, distribution } => match std::env::var_os(var) {
                Some(path) if !path.is_empty() => {
                    debug!(
                        "using local override {} from {}",
                        PathBuf::from(&path).display(),
                        var
                    );
                    TrustSource::LocalOverride(PathBuf::from(path))
                }
                _ => TrustSource::RemoteDistribution(Arc::clone(distribution)),
            },
        }
    }
}

//! TUF-backed trust distribution
//!
//! The local TUF root lives in a directory (`$TUF_ROOT`, defaulting to
//! `~/.sigstore/root`). It holds the trusted `root.json`, an optional
//! `remote.json` naming the mirror, and the metadata cache.
//!
//! ```no_run
//! use sigstore_trust_root::{FetchContext, Role, TrustDistribution, TufConfig, TufDistribution};
//!
//! # async fn example() -> Result<(), sigstore_trust_root::Error> {
//! let distribution = TufDistribution::new(TufConfig::from_env()?);
//! let client = distribution.connect(FetchContext::background()).await?;
//! let targets = client
//!     .get_targets_by_meta(FetchContext::background(), Role::Fulcio, &["fulcio.crt.pem"])
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tough::{HttpTransport, IntoVec, Repository, RepositoryLoader, TargetName};
use tracing::{debug, warn};
use url::Url;

use crate::target::{
    BoxFuture, FetchContext, Role, StatusKind, Target, TargetClient, TrustDistribution,
};
use crate::{Error, Result};

/// Default Sigstore production TUF mirror
pub const DEFAULT_MIRROR: &str = "https://tuf-repo-cdn.sigstore.dev";

/// Environment variable naming the local TUF root directory
pub const TUF_ROOT_ENV: &str = "TUF_ROOT";

const ROOT_JSON: &str = "root.json";
const REMOTE_JSON: &str = "remote.json";

/// Configuration for the TUF client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TufConfig {
    /// Base URL of the TUF mirror
    pub mirror: String,
    /// Local TUF root directory holding `root.json` and the metadata cache
    pub root_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    mirror: String,
}

impl TufConfig {
    /// Configuration for the production mirror rooted at `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            mirror: DEFAULT_MIRROR.to_string(),
            root_dir: root_dir.into(),
        }
    }

    /// Resolve the configuration from the environment
    ///
    /// The root directory comes from `TUF_ROOT` or `~/.sigstore/root`. A
    /// `remote.json` in that directory overrides the mirror.
    pub fn from_env() -> Result<Self> {
        let root_dir = match std::env::var_os(TUF_ROOT_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_root_dir()?,
        };
        let mut config = Self::new(root_dir);
        if let Some(mirror) = read_remote_mirror(&config.root_dir)? {
            config.mirror = mirror;
        }
        debug!(
            "TUF root at {} using mirror {}",
            config.root_dir.display(),
            config.mirror
        );
        Ok(config)
    }

    /// Set the mirror URL
    pub fn with_mirror(mut self, mirror: impl Into<String>) -> Self {
        self.mirror = mirror.into();
        self
    }

    /// Set the local root directory
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    fn urls(&self) -> Result<(Url, Url)> {
        let metadata_url = Url::parse(&self.mirror)
            .map_err(|e| Error::Config(format!("invalid TUF mirror {}: {}", self.mirror, e)))?;
        let targets_url = metadata_url
            .join("targets/")
            .map_err(|e| Error::Config(format!("invalid TUF mirror {}: {}", self.mirror, e)))?;
        Ok((metadata_url, targets_url))
    }
}

fn default_root_dir() -> Result<PathBuf> {
    let base = directories::BaseDirs::new()
        .ok_or_else(|| Error::Config("could not determine home directory".into()))?;
    Ok(base.home_dir().join(".sigstore").join("root"))
}

fn read_remote_mirror(root_dir: &Path) -> Result<Option<String>> {
    let path = root_dir.join(REMOTE_JSON);
    let raw = match std::fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Config(format!(
                "error reading {}: {}",
                path.display(),
                e
            )))
        }
    };
    let remote: RemoteFile = serde_json::from_slice(&raw)
        .map_err(|e| Error::Config(format!("error parsing {}: {}", path.display(), e)))?;
    Ok(Some(remote.mirror))
}

/// Trust distribution backed by a TUF repository
#[derive(Debug, Clone, Default)]
pub struct TufDistribution {
    config: Option<TufConfig>,
}

impl TufDistribution {
    /// Distribution using an explicit configuration
    pub fn new(config: TufConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// Distribution whose configuration is resolved from the environment on
    /// each connect
    pub fn from_env() -> Self {
        Self::default()
    }

    async fn load(&self) -> Result<TufClient> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => TufConfig::from_env()?,
        };
        let (metadata_url, targets_url) = config.urls()?;

        let root_path = config.root_dir.join(ROOT_JSON);
        let root_bytes = tokio::fs::read(&root_path).await.map_err(|e| {
            Error::SourceUnavailable(format!(
                "TUF root not initialized at {}: {}",
                root_path.display(),
                e
            ))
        })?;

        let repo = RepositoryLoader::new(&root_bytes, metadata_url, targets_url)
            .transport(HttpTransport::default())
            .datastore(config.root_dir.clone())
            .load()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("TUF repository load failed: {}", e)))?;

        debug!("loaded TUF repository from {}", config.mirror);
        Ok(TufClient { repo })
    }
}

impl TrustDistribution for TufDistribution {
    fn connect(&self, ctx: FetchContext) -> BoxFuture<'_, Box<dyn TargetClient>> {
        Box::pin(async move {
            let client = ctx.run("loading TUF repository", self.load()).await?;
            Ok(Box::new(client) as Box<dyn TargetClient>)
        })
    }
}

/// Custom metadata attached to sigstore targets
#[derive(Debug, Deserialize)]
struct SigstoreCustom {
    sigstore: SigstoreMeta,
}

#[derive(Debug, Deserialize)]
struct SigstoreMeta {
    usage: String,
    status: String,
}

impl SigstoreCustom {
    fn from_target(target: &tough::schema::Target) -> Option<(String, StatusKind)> {
        let value = serde_json::to_value(&target.custom).ok()?;
        let custom: SigstoreCustom = serde_json::from_value(value).ok()?;
        let status = custom.sigstore.status.parse().ok()?;
        Some((custom.sigstore.usage, status))
    }
}

/// A loaded TUF repository
pub struct TufClient {
    repo: Repository,
}

impl TufClient {
    async fn read(&self, name: &TargetName) -> Result<Vec<u8>> {
        let stream = self
            .repo
            .read_target(name)
            .await
            .map_err(|e| {
                Error::SourceUnavailable(format!("failed to read target {}: {}", name.raw(), e))
            })?
            .ok_or_else(|| {
                Error::SourceUnavailable(format!("target not found: {}", name.raw()))
            })?;
        stream.into_vec().await.map_err(|e| {
            Error::SourceUnavailable(format!(
                "failed to read contents of target {}: {}",
                name.raw(),
                e
            ))
        })
    }

    async fn collect(&self, role: Role, fallback_names: &[&str]) -> Result<Vec<Target>> {
        let mut matched = Vec::new();
        for (name, target) in &self.repo.targets().signed.targets {
            let Some((usage, status)) = SigstoreCustom::from_target(target) else {
                continue;
            };
            if !usage.eq_ignore_ascii_case(role.usage()) {
                continue;
            }
            let bytes = self.read(name).await?;
            matched.push(Target {
                name: name.raw().to_string(),
                bytes,
                status,
            });
        }

        if matched.is_empty() {
            for fallback in fallback_names {
                let name = TargetName::new(*fallback)
                    .map_err(|e| Error::Parse(format!("invalid target name {}: {}", fallback, e)))?;
                match self.read(&name).await {
                    Ok(bytes) => matched.push(Target::active(*fallback, bytes)),
                    Err(e) => warn!("skipping fallback target {}: {}", fallback, e),
                }
            }
        }

        matched.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("found {} {} targets", matched.len(), role);
        Ok(matched)
    }
}

impl TargetClient for TufClient {
    fn get_targets_by_meta<'a>(
        &'a self,
        ctx: FetchContext,
        role: Role,
        fallback_names: &'a [&'a str],
    ) -> BoxFuture<'a, Vec<Target>> {
        Box::pin(async move {
            ctx.run("reading TUF targets", self.collect(role, fallback_names))
                .await
        })
    }
}

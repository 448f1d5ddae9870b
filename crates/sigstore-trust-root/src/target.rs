//! The trust-distribution collaborator contract
//!
//! Trust material that is not supplied through a local override is fetched
//! from a signed distribution service (a TUF repository in production). The
//! service is modelled by two traits: [`TrustDistribution`] hands out a
//! [`TargetClient`] handle, and the handle answers metadata queries. The
//! handle is released when it is dropped, on success and failure alike.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;

use crate::{Error, Result};

/// Boxed future returned by the collaborator traits
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The purpose a distributed target is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Fulcio root and intermediate certificates
    Fulcio,
    /// Certificate transparency log public keys
    Ctfe,
}

impl Role {
    /// The usage string carried in target metadata
    pub fn usage(&self) -> &'static str {
        match self {
            Role::Fulcio => "Fulcio",
            Role::Ctfe => "CTFE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.usage())
    }
}

/// Lifecycle status of a distributed target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusKind {
    /// Currently in use
    #[default]
    Active,
    /// Retired, still honored for historical artifacts
    Expired,
}

impl FromStr for StatusKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("active") {
            Ok(StatusKind::Active)
        } else if s.eq_ignore_ascii_case("expired") {
            Ok(StatusKind::Expired)
        } else {
            Err(Error::Parse(format!("unknown target status: {:?}", s)))
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Active => f.write_str("Active"),
            StatusKind::Expired => f.write_str("Expired"),
        }
    }
}

/// A target file returned by the distribution service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Target name within the repository
    pub name: String,
    /// Raw target contents
    pub bytes: Vec<u8>,
    /// Lifecycle status from the target metadata
    pub status: StatusKind,
}

impl Target {
    /// Create an active target
    pub fn active(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            status: StatusKind::Active,
        }
    }

    /// Create an expired target
    pub fn expired(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusKind::Expired,
            ..Self::active(name, bytes)
        }
    }
}

/// Cancellation and deadline carrier for remote work
///
/// A context without a deadline never times out.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchContext {
    deadline: Option<Instant>,
}

impl FetchContext {
    /// A context without a deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run `operation` under this context's deadline
    ///
    /// An elapsed deadline surfaces as [`Error::SourceUnavailable`].
    pub async fn run<T, F>(&self, stage: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.deadline {
            None => operation.await,
            Some(deadline) => tokio::time::timeout_at(deadline, operation)
                .await
                .map_err(|_| {
                    Error::SourceUnavailable(format!("deadline exceeded while {}", stage))
                })?,
        }
    }
}

/// A signed distribution service for trust material
pub trait TrustDistribution: Send + Sync {
    /// Acquire a client handle
    fn connect(&self, ctx: FetchContext) -> BoxFuture<'_, Box<dyn TargetClient>>;
}

/// A live handle on the distribution service
pub trait TargetClient: Send + Sync {
    /// Return every target tagged with `role`
    ///
    /// When no target carries a matching usage tag, the targets named in
    /// `fallback_names` are returned instead, all marked active.
    fn get_targets_by_meta<'a>(
        &'a self,
        ctx: FetchContext,
        role: Role,
        fallback_names: &'a [&'a str],
    ) -> BoxFuture<'a, Vec<Target>>;
}

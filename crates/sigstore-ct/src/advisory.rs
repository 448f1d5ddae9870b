//! Non-fatal notices attached to a successful verification

use std::fmt;
use std::path::PathBuf;

use crate::LogId;

/// Where the verified SCTs came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SctMode {
    /// SCTs embedded in the certificate's SCT list extension
    Embedded,
    /// A detached SCT from the add-chain response
    Detached,
}

impl fmt::Display for SctMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SctMode::Embedded => f.write_str("embedded"),
            SctMode::Detached => f.write_str("detached"),
        }
    }
}

/// A caller-visible notice that does not change the verification outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The log key came from an operator-supplied file
    NonStandardLogKey { path: PathBuf },
    /// An SCT was verified with a log key whose status is expired
    ExpiredLogKey { log_id: LogId, mode: SctMode },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::NonStandardLogKey { path } => write!(
                f,
                "using a non-standard public key for verifying SCT: {}",
                path.display()
            ),
            Advisory::ExpiredLogKey { log_id, mode } => write!(
                f,
                "successfully verified {} SCT using an expired verification key ({})",
                mode, log_id
            ),
        }
    }
}

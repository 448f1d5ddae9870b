//! Certificate Transparency verification for Fulcio certificates
//!
//! This crate checks that a Fulcio-issued certificate was recorded in a
//! certificate transparency log:
//! - SCTs embedded in the certificate are verified as precertificate entries
//! - A detached SCT (add-chain response) is verified as an X.509 entry
//! - CT log keys come from TUF or from `SIGSTORE_CT_LOG_PUBLIC_KEY_FILE`
//!
//! # Example
//!
//! ```no_run
//! use sigstore_ct::{SctMode, SctVerifier};
//! use sigstore_trust_root::{FetchContext, TrustSourceResolver};
//!
//! # async fn example(cert_pem: &[u8], chain_pem: &[u8]) -> Result<(), sigstore_ct::Error> {
//! let verifier = SctVerifier::new(TrustSourceResolver::local("ctfe.pub"));
//! let outcome = verifier
//!     .verify_sct(&FetchContext::background(), cert_pem, chain_pem, &[])
//!     .await?;
//! assert_eq!(outcome.mode, SctMode::Embedded);
//! for advisory in &outcome.advisories {
//!     eprintln!("{}", advisory);
//! }
//! # Ok(())
//! # }
//! ```

pub mod add_chain;
pub mod advisory;
pub mod error;
pub mod log_id;
pub mod registry;
pub mod sct;
pub mod verify;

pub use add_chain::AddChainResponse;
pub use advisory::{Advisory, SctMode};
pub use error::{Error, ErrorKind, Result};
pub use log_id::LogId;
pub use registry::{LogKeyEntry, LogKeyRegistry, CTFE_TARGET};
pub use sct::{embedded_scts, LogEntry, SctRecord};
pub use verify::{contains_sct, verify_embedded_sct, verify_sct, SctVerification, SctVerifier};

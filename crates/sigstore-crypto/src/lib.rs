//! Cryptographic primitives for Sigstore trust decisions
//!
//! This crate provides public key decoding, hashing, certificate utilities and
//! signature verification using aws-lc-rs as the cryptographic backend.

pub mod error;
pub mod hash;
pub mod keys;
pub mod signing;
pub mod verification;
pub mod x509;

pub use error::{Error, Result};
pub use hash::sha256;
pub use keys::{parse_alternate_public_key, EcCurve, KeyAlgorithm, PublicKey};
pub use signing::{KeyPair, SigningScheme};
pub use verification::{verify_signature, VerificationKey};
pub use x509::{
    certificate_from_pem, certificates_from_pem, certificates_to_pem, parse_certificate,
    subject_public_key_info_der,
};

//! Signing schemes and ECDSA key pairs using aws-lc-rs
//!
//! Verification of SCTs never needs a private key; the key pairs here exist so
//! callers (and tests) can mint log keys and signatures that the verifier
//! understands.

use crate::error::{Error, Result};
use aws_lc_rs::{
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, EcdsaSigningAlgorithm, KeyPair as AwsKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
        ECDSA_P384_SHA384_ASN1_SIGNING,
    },
};
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1, SECP_384_R_1};
use der::asn1::BitString;
use der::Encode;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

/// Supported signature verification schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
    /// ECDSA P-256 with SHA-256
    EcdsaP256Sha256,
    /// ECDSA P-384 with SHA-384
    EcdsaP384Sha384,
    /// Ed25519
    Ed25519,
    /// RSA PKCS#1 v1.5 with SHA-256
    RsaPkcs1Sha256,
    /// RSA PKCS#1 v1.5 with SHA-384
    RsaPkcs1Sha384,
    /// RSA PKCS#1 v1.5 with SHA-512
    RsaPkcs1Sha512,
}

impl SigningScheme {
    /// Get the name of this scheme
    pub fn name(&self) -> &'static str {
        match self {
            SigningScheme::EcdsaP256Sha256 => "ECDSA_P256_SHA256",
            SigningScheme::EcdsaP384Sha384 => "ECDSA_P384_SHA384",
            SigningScheme::Ed25519 => "ED25519",
            SigningScheme::RsaPkcs1Sha256 => "RSA_PKCS1_SHA256",
            SigningScheme::RsaPkcs1Sha384 => "RSA_PKCS1_SHA384",
            SigningScheme::RsaPkcs1Sha512 => "RSA_PKCS1_SHA512",
        }
    }
}

/// An ECDSA key pair for signing
pub enum KeyPair {
    /// ECDSA P-256 key pair
    EcdsaP256(EcdsaKeyPair),
    /// ECDSA P-384 key pair
    EcdsaP384(EcdsaKeyPair),
}

impl KeyPair {
    /// Generate a new ECDSA P-256 key pair
    pub fn generate_ecdsa_p256() -> Result<Self> {
        Self::generate(&ECDSA_P256_SHA256_ASN1_SIGNING).map(KeyPair::EcdsaP256)
    }

    /// Generate a new ECDSA P-384 key pair
    pub fn generate_ecdsa_p384() -> Result<Self> {
        Self::generate(&ECDSA_P384_SHA384_ASN1_SIGNING).map(KeyPair::EcdsaP384)
    }

    fn generate(alg: &'static EcdsaSigningAlgorithm) -> Result<EcdsaKeyPair> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, &rng)
            .map_err(|_| Error::InvalidKeyFormat("failed to generate ECDSA key".to_string()))?;
        Ok(EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref())?)
    }

    fn inner(&self) -> &EcdsaKeyPair {
        match self {
            KeyPair::EcdsaP256(kp) | KeyPair::EcdsaP384(kp) => kp,
        }
    }

    /// Scheme matching this key's curve
    pub fn scheme(&self) -> SigningScheme {
        match self {
            KeyPair::EcdsaP256(_) => SigningScheme::EcdsaP256Sha256,
            KeyPair::EcdsaP384(_) => SigningScheme::EcdsaP384Sha384,
        }
    }

    /// ASN.1 DER ECDSA signature over `data`
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        self.inner()
            .sign(&rng, data)
            .map(|sig| sig.as_ref().to_vec())
            .map_err(|_| {
                Error::InvalidKeyFormat(format!("{} key cannot sign", self.scheme().name()))
            })
    }

    /// Get the public key in DER-encoded SubjectPublicKeyInfo format
    pub fn public_key_to_der(&self) -> Result<Vec<u8>> {
        let curve = match self {
            KeyPair::EcdsaP256(_) => SECP_256_R_1,
            KeyPair::EcdsaP384(_) => SECP_384_R_1,
        };

        let spki = SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(der::Any::encode_from(&curve)?),
            },
            subject_public_key: BitString::from_bytes(self.inner().public_key().as_ref())?,
        };

        Ok(spki.to_der()?)
    }

    /// Get the public key in PEM-encoded SubjectPublicKeyInfo format
    pub fn public_key_to_pem(&self) -> Result<String> {
        let der = self.public_key_to_der()?;
        Ok(pem::encode(&pem::Pem::new("PUBLIC KEY", der)))
    }
}

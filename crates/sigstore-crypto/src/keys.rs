//! Public key decoding
//!
//! Keys are decoded into a closed set of algorithms. Everything downstream
//! (log IDs, signature verification, algorithm policy) works from the DER
//! SubjectPublicKeyInfo, which is the canonical encoding for every variant.

use crate::error::{Error, Result};
use crate::signing::SigningScheme;
use crate::verification::verify_signature;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1};
use const_oid::db::rfc8410::ID_ED_25519;
use const_oid::ObjectIdentifier;
use der::asn1::{BitString, Null, UintRef};
use der::{Decode, Encode, Sequence};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef};
use std::fmt;

/// Named elliptic curves supported for ECDSA keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
}

/// Algorithm of a decoded public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// Elliptic-curve ECDSA key
    Ecdsa(EcCurve),
    /// RSA key
    Rsa,
    /// Ed25519 key
    Ed25519,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Ecdsa(EcCurve::P256) => write!(f, "ECDSA P-256"),
            KeyAlgorithm::Ecdsa(EcCurve::P384) => write!(f, "ECDSA P-384"),
            KeyAlgorithm::Rsa => write!(f, "RSA"),
            KeyAlgorithm::Ed25519 => write!(f, "Ed25519"),
        }
    }
}

/// PKCS#1 RSAPublicKey (RFC 8017 A.1.1)
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// A decoded public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: KeyAlgorithm,
    spki_der: Vec<u8>,
}

impl PublicKey {
    /// Decode a DER SubjectPublicKeyInfo (PKIX) public key
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| Error::InvalidKeyFormat(format!("not a PKIX public key: {}", e)))?;

        let alg_oid = spki.algorithm.oid;
        let algorithm = if alg_oid == ID_EC_PUBLIC_KEY {
            let params = spki.algorithm.parameters.ok_or_else(|| {
                Error::InvalidKeyFormat("EC key missing curve parameters".to_string())
            })?;
            let curve_oid = ObjectIdentifier::from_bytes(params.value()).map_err(|e| {
                Error::InvalidKeyFormat(format!("failed to parse EC curve OID: {}", e))
            })?;

            if curve_oid == SECP_256_R_1 {
                KeyAlgorithm::Ecdsa(EcCurve::P256)
            } else if curve_oid == SECP_384_R_1 {
                KeyAlgorithm::Ecdsa(EcCurve::P384)
            } else {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "unsupported EC curve OID: {}",
                    curve_oid
                )));
            }
        } else if alg_oid == RSA_ENCRYPTION {
            RsaPublicKey::from_der(spki.subject_public_key.raw_bytes()).map_err(|e| {
                Error::InvalidKeyFormat(format!("malformed RSA public key: {}", e))
            })?;
            KeyAlgorithm::Rsa
        } else if alg_oid == ID_ED_25519 {
            KeyAlgorithm::Ed25519
        } else {
            return Err(Error::UnsupportedAlgorithm(format!(
                "unsupported public key algorithm OID: {}",
                alg_oid
            )));
        };

        Ok(Self {
            algorithm,
            spki_der: der.to_vec(),
        })
    }

    /// Decode a DER PKCS#1 RSAPublicKey
    ///
    /// The key is re-wrapped into its SubjectPublicKeyInfo form so it hashes
    /// and verifies exactly like the same key delivered as PKIX.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_der(der)
            .map_err(|e| Error::InvalidKeyFormat(format!("not a PKCS#1 public key: {}", e)))?;

        let spki = SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: RSA_ENCRYPTION,
                parameters: Some(der::Any::encode_from(&Null)?),
            },
            subject_public_key: BitString::from_bytes(der)?,
        };

        Ok(Self {
            algorithm: KeyAlgorithm::Rsa,
            spki_der: spki.to_der()?,
        })
    }

    /// Decode a PEM public key
    ///
    /// `PUBLIC KEY` blocks are decoded as PKIX, `RSA PUBLIC KEY` blocks as
    /// PKCS#1. Any other block type is rejected.
    pub fn from_pem(input: &[u8]) -> Result<Self> {
        let block = pem::parse(input)
            .map_err(|e| Error::Pem(format!("failed to decode PEM public key: {}", e)))?;

        match block.tag() {
            "PUBLIC KEY" => Self::from_spki_der(block.contents()),
            "RSA PUBLIC KEY" => Self::from_pkcs1_der(block.contents()),
            other => Err(Error::Pem(format!("unsupported PEM block type: {}", other))),
        }
    }

    /// The key's algorithm
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Whether this is an elliptic-curve key
    pub fn is_ecdsa(&self) -> bool {
        matches!(self.algorithm, KeyAlgorithm::Ecdsa(_))
    }

    /// The DER SubjectPublicKeyInfo encoding of the key
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Verify `signature` over `data` with this key
    pub fn verify(&self, data: &[u8], signature: &[u8], scheme: SigningScheme) -> Result<()> {
        let compatible = matches!(
            (self.algorithm, scheme),
            (KeyAlgorithm::Ecdsa(EcCurve::P256), SigningScheme::EcdsaP256Sha256)
                | (KeyAlgorithm::Ecdsa(EcCurve::P384), SigningScheme::EcdsaP384Sha384)
                | (KeyAlgorithm::Ed25519, SigningScheme::Ed25519)
                | (
                    KeyAlgorithm::Rsa,
                    SigningScheme::RsaPkcs1Sha256
                        | SigningScheme::RsaPkcs1Sha384
                        | SigningScheme::RsaPkcs1Sha512
                )
        );
        if !compatible {
            return Err(Error::Verification(format!(
                "{} key cannot verify {} signatures",
                self.algorithm,
                scheme.name()
            )));
        }

        match self.algorithm {
            // aws-lc-rs takes the raw 32-byte key for Ed25519
            KeyAlgorithm::Ed25519 => {
                let spki = SubjectPublicKeyInfoRef::try_from(self.spki_der.as_slice())
                    .map_err(|e| Error::InvalidKeyFormat(e.to_string()))?;
                verify_signature(spki.subject_public_key.raw_bytes(), data, signature, scheme)
            }
            _ => verify_signature(&self.spki_der, data, signature, scheme),
        }
    }
}

/// Decode operator-supplied public key material in whatever encoding it came in.
///
/// The input is PEM-decoded when it contains a PEM block and used as DER
/// otherwise. The DER is tried as PKIX first and as PKCS#1 RSA second.
pub fn parse_alternate_public_key(input: &[u8]) -> Result<PublicKey> {
    let der_bytes = match pem::parse(input) {
        Ok(block) => block.into_contents(),
        Err(_) => {
            tracing::debug!("public key is not PEM encoded, trying as DER");
            input.to_vec()
        }
    };

    PublicKey::from_spki_der(&der_bytes).or_else(|pkix_err| {
        PublicKey::from_pkcs1_der(&der_bytes).map_err(|pkcs1_err| {
            Error::InvalidKeyFormat(format!(
                "failed to parse alternate public key ({}; {})",
                pkix_err, pkcs1_err
            ))
        })
    })
}

//! Private key loading and raw signing, independent of CMS framing.

use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::pkcs8::DecodePrivateKey as RsaDecodePrivateKey;
use rsa::RsaPrivateKey;

use p256::ecdsa::SigningKey as EcdsaSigningKey;
use p256::pkcs8::DecodePrivateKey as EcDecodePrivateKey;

use rasn::types::ObjectIdentifier;
use rasn_cms::algorithms::SHA1_WITH_RSA;
use sha1::Sha1;
use sha2::Sha256;
use signature::{SignatureEncoding, Signer as _};

use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;
use crate::spc::oids::{ECDSA_WITH_SHA1, ECDSA_WITH_SHA256, SHA256_WITH_RSA_ENCRYPTION};

/// The private key half of a signing identity. Holds the key material
/// only; certificate chain handling lives in [`crate::cms::chain`].
pub enum SigningKey {
    Rsa(RsaPrivateKey),
    EcdsaP256(EcdsaSigningKey),
}

impl SigningKey {
    /// Load a PKCS#8 PEM private key, trying RSA first and then P-256 EC.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(Self::Rsa(key));
        }
        if let Ok(key) = EcdsaSigningKey::from_pkcs8_pem(pem) {
            return Ok(Self::EcdsaP256(key));
        }
        Err(SigningError::Configuration(
            "private key is neither a PKCS#8 RSA key nor a PKCS#8 P-256 EC key".into(),
        ))
    }

    /// Sign `message` (the DER encoding of the `SignedAttributes` SET OF,
    /// in the orchestration this crate uses it for) with `algorithm` as
    /// the digest. P-256 keys only support SHA-256 — the curve's usual
    /// pairing and the only one this crate wires up.
    pub fn sign(&self, algorithm: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rsa(key) => match algorithm {
                HashAlgorithm::Sha1 => {
                    let signer = RsaSigningKey::<Sha1>::new(key.clone());
                    let sig = signer
                        .try_sign(message)
                        .map_err(|e| SigningError::Crypto(format!("RSA signing failed: {e}")))?;
                    Ok(sig.to_vec())
                }
                HashAlgorithm::Sha256 => {
                    let signer = RsaSigningKey::<Sha256>::new(key.clone());
                    let sig = signer
                        .try_sign(message)
                        .map_err(|e| SigningError::Crypto(format!("RSA signing failed: {e}")))?;
                    Ok(sig.to_vec())
                }
            },
            Self::EcdsaP256(key) => {
                if algorithm != HashAlgorithm::Sha256 {
                    return Err(SigningError::Configuration(
                        "P-256 keys in this crate only sign with SHA-256".into(),
                    ));
                }
                let sig: ecdsa::Signature<p256::NistP256> = key
                    .try_sign(message)
                    .map_err(|e| SigningError::Crypto(format!("ECDSA signing failed: {e}")))?;
                Ok(sig.to_der().to_vec())
            }
        }
    }

    /// OID for `SignerInfo.signatureAlgorithm`, the (key type, digest)
    /// pairing actually used by `sign`.
    pub fn signature_algorithm_oid(&self, algorithm: HashAlgorithm) -> ObjectIdentifier {
        match (self, algorithm) {
            (Self::Rsa(_), HashAlgorithm::Sha1) => SHA1_WITH_RSA.into(),
            (Self::Rsa(_), HashAlgorithm::Sha256) => SHA256_WITH_RSA_ENCRYPTION.into(),
            (Self::EcdsaP256(_), HashAlgorithm::Sha1) => ECDSA_WITH_SHA1.into(),
            (Self::EcdsaP256(_), HashAlgorithm::Sha256) => ECDSA_WITH_SHA256.into(),
        }
    }
}

//! Orchestrates pad → content → signature → timestamp → write-back
//! behind a single [`Signer::sign`] call.

use std::path::Path;

use tracing::{debug, info, instrument};

use rasn_pkix::Certificate;

use crate::cms::{build_signed_data, trim_self_signed_root, SigningKey};
use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;
use crate::pe::{PeImage, CERTIFICATE_TABLE_INDEX};
use crate::profile::SigningProfile;
use crate::spc::ProgramInfo;
use crate::timestamp::{AuthenticodeTimestamper, Rfc3161Timestamper, Timestamper};

/// `WIN_CERT_REVISION_2_0`.
const WIN_CERT_REVISION_2_0: u16 = 0x0200;
/// `WIN_CERT_TYPE_PKCS_SIGNED_DATA`.
const WIN_CERT_TYPE_PKCS_SIGNED_DATA: u16 = 0x0002;

/// Builds a [`Signer`] from required key/chain material plus a set of
/// optional knobs, any of which can also arrive from a [`SigningProfile`].
#[derive(Default)]
pub struct SignerBuilder {
    chain: Option<Vec<Certificate>>,
    key: Option<SigningKey>,
    hash_algorithm: Option<String>,
    program: ProgramInfo,
    timestamping: bool,
    use_rfc3161: bool,
    timestamp_url: Option<String>,
}

impl SignerBuilder {
    pub fn new() -> Self {
        Self {
            chain: None,
            key: None,
            hash_algorithm: None,
            program: ProgramInfo::default(),
            timestamping: true,
            use_rfc3161: false,
            timestamp_url: None,
        }
    }

    /// Certificates to embed, leaf first. Trimmed of a trailing
    /// self-signed root (unless the chain is exactly the self-signed
    /// leaf) when the signer is built.
    pub fn chain(mut self, chain: Vec<Certificate>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Key for the primary signature.
    pub fn private_key(mut self, key: SigningKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Name in `{"SHA-1", "SHA1", "SHA-256", "SHA256"}`, case-insensitive.
    /// An unrecognised name is a `SigningError::Configuration` raised from
    /// `build()`, not a silent fallback — see [`HashAlgorithm::parse`].
    pub fn hash_algorithm(mut self, name: impl Into<String>) -> Self {
        self.hash_algorithm = Some(name.into());
        self
    }

    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.program.name = Some(name.into());
        self
    }

    pub fn program_url(mut self, url: impl Into<String>) -> Self {
        self.program.url = Some(url.into());
        self
    }

    pub fn timestamping(mut self, enabled: bool) -> Self {
        self.timestamping = enabled;
        self
    }

    pub fn use_rfc3161(mut self, enabled: bool) -> Self {
        self.use_rfc3161 = enabled;
        self
    }

    pub fn timestamp_url(mut self, url: impl Into<String>) -> Self {
        self.timestamp_url = Some(url.into());
        self
    }

    /// Apply every field `profile` sets, leaving builder defaults (or
    /// prior explicit calls) in place for anything the profile omits.
    /// Key and chain are never read from a profile — see
    /// [`SigningProfile`]'s own documentation for why.
    pub fn apply_profile(mut self, profile: &SigningProfile) -> Self {
        if let Some(hash_algorithm) = &profile.hash_algorithm {
            self.hash_algorithm = Some(hash_algorithm.clone());
        }
        if let Some(name) = &profile.program_name {
            self.program.name = Some(name.clone());
        }
        if let Some(url) = &profile.program_url {
            self.program.url = Some(url.clone());
        }
        if let Some(timestamping) = profile.timestamping {
            self.timestamping = timestamping;
        }
        if let Some(use_rfc3161) = profile.use_rfc3161 {
            self.use_rfc3161 = use_rfc3161;
        }
        if let Some(url) = &profile.timestamp_url {
            self.timestamp_url = Some(url.clone());
        }
        self
    }

    /// Validate configuration and produce a [`Signer`]. No file is
    /// touched by this call or by anything it does — failures here are
    /// all `SigningError::Configuration`.
    pub fn build(self) -> Result<Signer> {
        let key = self
            .key
            .ok_or_else(|| SigningError::Configuration("no private key configured".into()))?;
        let chain = self
            .chain
            .ok_or_else(|| SigningError::Configuration("no certificate chain configured".into()))?;
        if chain.is_empty() {
            return Err(SigningError::Configuration("certificate chain is empty".into()));
        }

        let hash_algorithm = match self.hash_algorithm {
            Some(name) => HashAlgorithm::parse(&name).ok_or_else(|| {
                SigningError::Configuration(format!("unrecognised hash algorithm {name:?}"))
            })?,
            None => HashAlgorithm::default(),
        };
        hash_algorithm.warn_if_weak();

        let chain = trim_self_signed_root(chain);

        let timestamper: Option<Box<dyn Timestamper>> = if self.timestamping {
            Some(if self.use_rfc3161 {
                Box::new(Rfc3161Timestamper::new(self.timestamp_url))
            } else {
                Box::new(AuthenticodeTimestamper::new(self.timestamp_url))
            })
        } else {
            None
        };

        Ok(Signer {
            chain,
            key,
            hash_algorithm,
            program: self.program,
            timestamper,
        })
    }
}

/// Orchestrates a single signing operation. Stateless across calls to
/// `sign` beyond the configuration supplied at construction; owned by one
/// caller, never shared.
pub struct Signer {
    chain: Vec<Certificate>,
    key: SigningKey,
    hash_algorithm: HashAlgorithm,
    program: ProgramInfo,
    timestamper: Option<Box<dyn Timestamper>>,
}

impl Signer {
    pub fn builder() -> SignerBuilder {
        SignerBuilder::new()
    }

    /// Sign the PE image at `path` in place: pad(8) → digest → content →
    /// signature → (optional) timestamp → DER-encode → pad(8) → frame →
    /// write Certificate Table → recompute checksum → write-back.
    ///
    /// Any prior Certificate Table is replaced, not appended beside — a
    /// re-signed file still verifies (§8 property 3).
    #[instrument(skip(self), fields(path = %path.display(), hash = self.hash_algorithm.name()))]
    pub fn sign(&self, path: &Path) -> Result<()> {
        let mut image = PeImage::open(path)?;
        image.strip_existing_certificate_table();
        image.pad(8);

        let image_digest = image.compute_digest(self.hash_algorithm);
        debug!(digest_len = image_digest.len(), "computed image digest");

        let signed_data = build_signed_data(
            &self.key,
            &self.chain,
            self.hash_algorithm,
            &image_digest,
            &self.program,
        )?;

        let signed_data = match &self.timestamper {
            Some(timestamper) => {
                let timestamped = timestamper.timestamp(self.hash_algorithm, signed_data)?;
                info!("attached counter-signature");
                timestamped
            }
            None => signed_data,
        };

        let der = rasn::der::encode(&signed_data)
            .map_err(|e| SigningError::Crypto(format!("encoding CMS SignedData: {e}")))?;
        let entry = frame_certificate_entry(&der);

        image.write_data_directory(CERTIFICATE_TABLE_INDEX, &entry)?;
        image.close(path, true)?;
        info!(certificate_table_len = entry.len(), "signed");
        Ok(())
    }
}

/// Zero-pad `der` up to an 8-byte multiple and prepend the
/// `WIN_CERTIFICATE` header (§6): `dwLength`, `wRevision`,
/// `wCertificateType`, little-endian.
fn frame_certificate_entry(der: &[u8]) -> Vec<u8> {
    let padded_len = der.len().div_ceil(8) * 8;
    let mut entry = Vec::with_capacity(8 + padded_len);
    entry.extend_from_slice(&((8 + padded_len) as u32).to_le_bytes());
    entry.extend_from_slice(&WIN_CERT_REVISION_2_0.to_le_bytes());
    entry.extend_from_slice(&WIN_CERT_TYPE_PKCS_SIGNED_DATA.to_le_bytes());
    entry.extend_from_slice(der);
    entry.resize(8 + padded_len, 0);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_header_fields_are_little_endian() {
        let entry = frame_certificate_entry(&[1, 2, 3]);
        assert_eq!(entry.len() % 8, 0);
        assert_eq!(u32::from_le_bytes(entry[0..4].try_into().unwrap()), entry.len() as u32);
        assert_eq!(u16::from_le_bytes(entry[4..6].try_into().unwrap()), WIN_CERT_REVISION_2_0);
        assert_eq!(u16::from_le_bytes(entry[6..8].try_into().unwrap()), WIN_CERT_TYPE_PKCS_SIGNED_DATA);
        assert_eq!(&entry[8..11], &[1, 2, 3]);
    }

    #[test]
    fn frame_pads_bcertificate_to_8_byte_multiple() {
        let entry = frame_certificate_entry(&[0u8; 5]);
        assert_eq!(entry.len(), 16); // 8-byte header + 8-byte padded cert
    }

    #[test]
    fn builder_requires_key_and_chain() {
        let err = SignerBuilder::new().build().unwrap_err();
        assert!(matches!(err, SigningError::Configuration(_)));
    }

    #[test]
    fn builder_rejects_unrecognised_hash_algorithm() {
        let key = SigningKey::Rsa(rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap());
        let chain = vec![crate::cms::chain::self_signed_leaf_for_tests()];
        let err = SignerBuilder::new()
            .private_key(key)
            .chain(chain)
            .hash_algorithm("md5")
            .build()
            .unwrap_err();
        assert!(matches!(err, SigningError::Configuration(_)));
    }
}

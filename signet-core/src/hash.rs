//! The digest algorithm selection used throughout a signing operation.

use std::time::{SystemTime, UNIX_EPOCH};

use rasn::types::Oid;
use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use tracing::warn;

/// `2016-01-01T00:00:00Z` as a Unix timestamp — the boundary the historical
/// Authenticode tooling used to decide between SHA-1 and SHA-256 defaults.
const HISTORICAL_SHA256_CUTOVER_UNIX: u64 = 1_451_606_400;

/// Digest algorithm carried through content building, signing, and
/// timestamping. Closed set: Authenticode only recognizes these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// DER OID for this algorithm's `AlgorithmIdentifier`.
    pub fn digest_oid(self) -> &'static Oid {
        match self {
            HashAlgorithm::Sha1 => rasn_cms::algorithms::SHA1,
            HashAlgorithm::Sha256 => SHA256,
        }
    }

    /// OID used in the RFC 3161 `MessageImprint.hashAlgorithm` field. Same
    /// identifier as `digest_oid` — Authenticode and RFC 3161 share the
    /// digest algorithm OID space.
    pub fn timestamp_oid(self) -> &'static Oid {
        self.digest_oid()
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
        }
    }

    /// Digest `data` with this algorithm.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Parse a configuration string (`"SHA-1"`/`"SHA1"`/`"SHA-256"`/`"SHA256"`,
    /// case-insensitive). Unlike the historical tool this silently falls back
    /// to a default for, callers here get an explicit `None` on an
    /// unrecognised name — see `signer::SignerBuilder::hash_algorithm` for
    /// where that becomes a `SigningError::Configuration`. The silent
    /// fallback this replaces is kept, inert, in `historical_default`'s
    /// doc comment for the record.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Some(HashAlgorithm::Sha1),
            "SHA256" => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    /// The historical wall-clock default: SHA-1 before 2016-01-01, SHA-256
    /// on or after. Not called by `SignerBuilder` — `Signer::builder()`
    /// defaults to SHA-256 unconditionally and warns when a caller asks for
    /// SHA-1 explicitly. Kept as a pure function so the legacy rule stays
    /// testable and documented rather than silently dropped.
    pub fn historical_default(now: SystemTime) -> Self {
        let unix = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if unix < HISTORICAL_SHA256_CUTOVER_UNIX {
            HashAlgorithm::Sha1
        } else {
            HashAlgorithm::Sha256
        }
    }

    /// Current recommended default: SHA-256, always. Warns if `self` ends
    /// up being SHA-1 so the deprecated choice isn't silent.
    pub(crate) fn warn_if_weak(self) {
        if self == HashAlgorithm::Sha1 {
            warn!("signing with SHA-1; SHA-256 is strongly recommended for new signatures");
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

/// `id-sha256` (2.16.840.1.101.3.4.2.1). `rasn-cms`'s `algorithms` module
/// only defines the legacy SHA-1/MD5/DSA family; SHA-256 isn't modeled
/// there yet, so it's defined here the same way the rest of this crate's
/// SPC-specific OIDs are (see `spc::oids`).
pub const SHA256: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 1]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_default_before_2016_is_sha1() {
        let before = UNIX_EPOCH + std::time::Duration::from_secs(HISTORICAL_SHA256_CUTOVER_UNIX - 1);
        assert_eq!(HashAlgorithm::historical_default(before), HashAlgorithm::Sha1);
    }

    #[test]
    fn historical_default_on_or_after_2016_is_sha256() {
        let at = UNIX_EPOCH + std::time::Duration::from_secs(HISTORICAL_SHA256_CUTOVER_UNIX);
        assert_eq!(HashAlgorithm::historical_default(at), HashAlgorithm::Sha256);

        let after = UNIX_EPOCH + std::time::Duration::from_secs(HISTORICAL_SHA256_CUTOVER_UNIX + 1000);
        assert_eq!(HashAlgorithm::historical_default(after), HashAlgorithm::Sha256);
    }

    #[test]
    fn default_is_unconditionally_sha256() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(HashAlgorithm::parse("SHA-256"), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::parse("sha256"), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::parse("Sha-1"), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::parse("md5"), None);
    }

    #[test]
    fn digest_lengths_match_algorithm() {
        assert_eq!(HashAlgorithm::Sha1.digest(b"hello").len(), 20);
        assert_eq!(HashAlgorithm::Sha256.digest(b"hello").len(), 32);
    }
}

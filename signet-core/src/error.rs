//! Unified error type surfaced from [`crate::signer::Signer::sign`].

use thiserror::Error;

/// Top-level failure taxonomy for a signing attempt.
///
/// Every variant is fatal to the in-progress `sign()` call; nothing in this
/// crate retries except transient timestamp HTTP failures (handled inside
/// [`crate::timestamp::http`] before a [`SigningError::Timestamp`] is ever
/// constructed).
#[derive(Debug, Error)]
pub enum SigningError {
    /// Bad input to `SignerBuilder` — missing key/chain, unrecognised
    /// algorithm name, inconsistent key/certificate pairing. Raised from
    /// facade construction, before any file is touched.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The PE container is not well-formed enough to sign: not a PE, a
    /// truncated header, or a data directory count/entry that doesn't fit
    /// the file. The file is never mutated when this is returned.
    #[error("PE structure error: {0}")]
    PeStructure(String),

    /// Digest, key, or ASN.1 encoding failure while building the signature
    /// in memory. The file is never mutated when this is returned, because
    /// signing always builds the full signature before any write-back.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Timestamp acquisition failed: network error, non-2xx status,
    /// malformed response, or an OID mismatch in the returned token. Only
    /// raised when timestamping is enabled.
    #[error("timestamp error: {0}")]
    Timestamp(String),

    /// Failure reading or writing the PE file itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SigningError>;

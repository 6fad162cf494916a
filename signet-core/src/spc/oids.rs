//! Object identifiers Authenticode needs that aren't modeled by
//! `rasn_cms::authenticode` or `rasn_cms::algorithms`.
//!
//! Everything else (SPC_INDIRECT_DATA_OBJID, SPC_PE_IMAGE_DATA_OBJID,
//! SPC_SP_OPUS_INFO_OBJID, SPC_STATEMENT_TYPE_OBJID, SPC_RFC3161_OBJID, the
//! CMS content-type/message-digest/counter-signature OIDs) comes straight
//! from `rasn_cms::authenticode` or the `rasn_cms` crate root.

use rasn::types::ConstOid;

/// Individual code signing purpose, the value carried inside the
/// `SpcStatementType` attribute (`1.3.6.1.4.1.311.2.1.21`).
pub const SPC_INDIVIDUAL_SP_KEY_PURPOSE_OBJID: ConstOid =
    ConstOid(&[1, 3, 6, 1, 4, 1, 311, 2, 1, 21]);

/// `sha256WithRSAEncryption` (1.2.840.113549.1.1.11).
pub const SHA256_WITH_RSA_ENCRYPTION: ConstOid = ConstOid(&[1, 2, 840, 113_549, 1, 1, 11]);

/// `sha1WithRSAEncryption` / PKCS#1 `rsaEncryption` signature with SHA-1
/// (1.2.840.113549.1.1.5). `rasn_cms::algorithms::SHA1_WITH_RSA` already
/// names this one, kept here only as a cross-reference when reading this
/// module alongside `algorithms.rs`.
pub use rasn_cms::algorithms::SHA1_WITH_RSA;

/// `ecdsa-with-SHA256` (1.2.840.10045.4.3.2).
pub const ECDSA_WITH_SHA256: ConstOid = ConstOid(&[1, 2, 840, 10_045, 4, 3, 2]);

/// `ecdsa-with-SHA1` (1.2.840.10045.4.1).
pub const ECDSA_WITH_SHA1: ConstOid = ConstOid(&[1, 2, 840, 10_045, 4, 1]);

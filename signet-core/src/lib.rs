//! Embeds Authenticode signatures into Portable Executable (PE) images.
//!
//! The entry point most callers want is [`signer::Signer`], built from
//! [`signer::SignerBuilder`]: it orchestrates PE digesting (`pe`), the
//! Authenticode content and attribute set (`spc`), CMS `SignedData`
//! assembly (`cms`), and counter-signature acquisition (`timestamp`) into
//! a single `sign()` call.

pub mod cms;
pub mod error;
pub mod hash;
pub mod pe;
pub mod profile;
pub mod signer;
pub mod spc;
pub mod timestamp;

pub use error::{Result, SigningError};
pub use hash::HashAlgorithm;
pub use signer::{Signer, SignerBuilder};

//! Signed Data Generator (§4.3): certificate chain handling, private key
//! signing, and CMS `SignedData` assembly.

pub mod chain;
pub mod key;
pub mod signed_data;

pub use chain::{parse_pem_chain, trim_self_signed_root};
pub use key::SigningKey;
pub use signed_data::build_signed_data;

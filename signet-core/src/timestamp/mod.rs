//! Timestamper (§4.4): attaches a server-issued counter-signature to the
//! primary `SignerInfo` as an unsigned attribute.

pub mod authenticode;
pub mod http;
pub mod rfc3161;

use rasn::types::{Any, Oid, SetOf};
use rasn_cms::SignedData;
use rasn_pkix::Attribute;

pub use authenticode::AuthenticodeTimestamper;
pub use rfc3161::Rfc3161Timestamper;

use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;

/// Common contract both timestamping strategies satisfy. Takes ownership
/// of the primary signature and returns it back with one additional
/// unsigned attribute.
pub trait Timestamper {
    fn timestamp(&self, algorithm: HashAlgorithm, primary: SignedData) -> Result<SignedData>;
}

fn only_signer_info(signed_data: &SignedData) -> Result<rasn_cms::SignerInfo> {
    match signed_data.signer_infos.to_vec().as_slice() {
        [info] => Ok((*info).clone()),
        other => Err(SigningError::Crypto(format!(
            "expected exactly one SignerInfo to timestamp, found {}",
            other.len()
        ))),
    }
}

/// The primary signer's `signature` field, i.e. the "encrypted digest"
/// both timestamping strategies hash or wrap.
pub(crate) fn primary_signature_bytes(signed_data: &SignedData) -> Result<Vec<u8>> {
    Ok(only_signer_info(signed_data)?.signature.to_vec())
}

/// Return `signed_data` with `value_der` attached to the primary
/// `SignerInfo`'s unsigned attributes under `oid`.
pub(crate) fn attach_unsigned_attribute(
    mut signed_data: SignedData,
    oid: &Oid,
    value_der: Vec<u8>,
) -> Result<SignedData> {
    let mut info = only_signer_info(&signed_data)?;
    let mut unsigned = info.unsigned_attrs.take().unwrap_or_default();
    let mut values = SetOf::new();
    values.insert(Any::new(value_der));
    unsigned.insert(Attribute {
        r#type: oid.into(),
        values,
    });
    info.unsigned_attrs = Some(unsigned);
    signed_data.signer_infos = SetOf::from_vec(vec![info]);
    Ok(signed_data)
}

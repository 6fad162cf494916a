//! Builds the `SpcIndirectDataContent` that becomes the CMS `eContent`.

use rasn::types::{Any, BitString};
use rasn_cms::authenticode::{
    DigestInfo, SpcAttributeTypeAndOptionalValue, SpcIndirectDataContent, SpcPeImageData,
    SpcPeImageFlags, SPC_PE_IMAGE_DATA_OBJID,
};
use rasn_pkix::AlgorithmIdentifier;

use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;

/// DER encoding of an ASN.1 NULL (tag 0x05, length 0).
const DER_NULL: [u8; 2] = [0x05, 0x00];

/// `data.value` of the content: an `SpcPeImageData` marking this as a PE
/// image digest (as opposed to the cabinet/catalog variants Authenticode
/// also defines). `flags` defaults to "include resources" — the flag value
/// signtool itself embeds for ordinary PE signing.
fn pe_image_marker() -> Result<Any> {
    let data = SpcPeImageData {
        flags: SpcPeImageFlags(BitString::from_element(0)),
        file: None,
    };
    let der = rasn::der::encode(&data)
        .map_err(|e| SigningError::Crypto(format!("encoding SpcPeImageData: {e}")))?;
    Ok(Any::new(der))
}

/// Build the `SpcIndirectDataContent` binding `image_digest` (already
/// computed by `pe::image::PeImage::compute_digest`) to the Authenticode
/// PE-image content type, using `algorithm` for the digest's
/// `AlgorithmIdentifier`. The NULL parameter is mandatory for Windows
/// verifier interoperability, not merely permitted.
pub fn build_spc_indirect_data_content(
    algorithm: HashAlgorithm,
    image_digest: &[u8],
) -> Result<SpcIndirectDataContent> {
    Ok(SpcIndirectDataContent {
        data: SpcAttributeTypeAndOptionalValue {
            attribute_type: SPC_PE_IMAGE_DATA_OBJID.into(),
            value: Some(pe_image_marker()?),
        },
        message_digest: DigestInfo {
            digest_algorithm: AlgorithmIdentifier {
                algorithm: algorithm.digest_oid().into(),
                parameters: Some(Any::new(DER_NULL.to_vec())),
            },
            digest: image_digest.to_vec().into(),
        },
    })
}

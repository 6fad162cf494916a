//! Signed Data Generator (§4.3): assembles the CMS `SignedData` that
//! becomes the Certificate Table payload.

use rasn::types::{Any, Integer, ObjectIdentifier, OctetString, SetOf};
use rasn_cms::authenticode::SPC_INDIRECT_DATA_OBJID;
use rasn_cms::{
    CertificateChoices, CertificateSet, ContentType, DigestAlgorithmIdentifiers,
    EncapsulatedContentInfo, SignedAttributes, SignedData, SignerIdentifier, SignerInfo,
    SignerInfos, CONTENT_TYPE, MESSAGE_DIGEST,
};
use rasn_pkix::{AlgorithmIdentifier, Attribute, Certificate};

use crate::cms::chain::issuer_and_serial;
use crate::cms::key::SigningKey;
use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;
use crate::spc::{build_authenticated_attributes, build_spc_indirect_data_content, ProgramInfo};

const DER_NULL: [u8; 2] = [0x05, 0x00];

fn encode_der<T: rasn::Encode>(value: &T) -> Result<Vec<u8>> {
    rasn::der::encode(value).map_err(|e| SigningError::Crypto(format!("DER encoding failed: {e}")))
}

fn digest_algorithm_identifier(algorithm: HashAlgorithm) -> AlgorithmIdentifier {
    AlgorithmIdentifier {
        algorithm: algorithm.digest_oid().into(),
        parameters: Some(Any::new(DER_NULL.to_vec())),
    }
}

fn single_value_set(oid: &rasn::types::Oid, value: Any) -> Attribute {
    let mut values = SetOf::new();
    values.insert(value);
    Attribute {
        r#type: oid.into(),
        values,
    }
}

/// content-type and message-digest attributes every CMS `SignerInfo`
/// carries, ahead of the Authenticode-specific ones from
/// [`build_authenticated_attributes`]. `content_digest` is the digest of
/// the eContent bytes (the DER of the `SpcIndirectDataContent`), not of
/// the image — the two only coincide by construction never by value.
fn cms_mandatory_attributes(content_digest: &[u8]) -> Result<Vec<Attribute>> {
    let content_type_attr = single_value_set(
        CONTENT_TYPE,
        Any::new(encode_der(&ObjectIdentifier::from(SPC_INDIRECT_DATA_OBJID))?),
    );

    let message_digest_attr = single_value_set(
        MESSAGE_DIGEST,
        Any::new(encode_der(&OctetString::from(content_digest.to_vec()))?),
    );

    Ok(vec![content_type_attr, message_digest_attr])
}

/// Build the signed portion of an Authenticode signature: the
/// `SpcIndirectDataContent` as the encapsulated content, and a single
/// `SignerInfo` over it, signed with `key`. Timestamping, if any, is
/// layered on afterward as an unsigned attribute (§4.4).
pub fn build_signed_data(
    key: &SigningKey,
    chain: &[Certificate],
    algorithm: HashAlgorithm,
    image_digest: &[u8],
    program: &ProgramInfo,
) -> Result<SignedData> {
    let leaf = chain
        .first()
        .ok_or_else(|| SigningError::Configuration("certificate chain is empty".into()))?;

    let content = build_spc_indirect_data_content(algorithm, image_digest)?;
    let content_der = encode_der(&content)?;
    let content_digest = algorithm.digest(&content_der);

    let mut signed_attrs: SignedAttributes = SetOf::new();
    for attr in cms_mandatory_attributes(&content_digest)? {
        signed_attrs.insert(attr);
    }
    for attr in build_authenticated_attributes(program)? {
        signed_attrs.insert(attr);
    }

    let message_to_sign = encode_der(&signed_attrs)?;
    let signature = key.sign(algorithm, &message_to_sign)?;

    let digest_algorithm = digest_algorithm_identifier(algorithm);

    let signer_info = SignerInfo {
        version: Integer::from(1),
        sid: SignerIdentifier::IssuerAndSerialNumber(issuer_and_serial(leaf)),
        digest_algorithm: digest_algorithm.clone(),
        signed_attrs: Some(signed_attrs),
        signature_algorithm: AlgorithmIdentifier {
            algorithm: key.signature_algorithm_oid(algorithm),
            parameters: Some(Any::new(DER_NULL.to_vec())),
        },
        signature: OctetString::from(signature),
        unsigned_attrs: None,
    };

    let mut digest_algorithms: DigestAlgorithmIdentifiers = SetOf::new();
    digest_algorithms.insert(digest_algorithm);

    let mut certificates: CertificateSet = SetOf::new();
    for cert in chain {
        certificates.insert(CertificateChoices::Certificate(Box::new(cert.clone())));
    }

    let mut signer_infos: SignerInfos = SetOf::new();
    signer_infos.insert(signer_info);

    Ok(SignedData {
        version: Integer::from(1),
        digest_algorithms,
        encap_content_info: EncapsulatedContentInfo {
            content_type: ContentType::from(SPC_INDIRECT_DATA_OBJID),
            content: Some(OctetString::from(content_der)),
        },
        certificates: Some(certificates),
        crls: None,
        signer_infos,
    })
}

//! Certificate chain loading and the root-trimming heuristic.

use rasn_cms::IssuerAndSerialNumber;
use rasn_pkix::Certificate;

use crate::error::{Result, SigningError};

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// Parse a concatenated PEM bundle (leaf first, intermediates after) into
/// DER-decoded certificates, in file order.
pub fn parse_pem_chain(pem: &str) -> Result<Vec<Certificate>> {
    let mut certs = Vec::new();
    let mut rest = pem;
    while let Some(start) = rest.find(PEM_BEGIN) {
        let body_start = start + PEM_BEGIN.len();
        let end = rest[body_start..]
            .find(PEM_END)
            .ok_or_else(|| SigningError::Configuration("unterminated PEM certificate block".into()))?;
        let body = &rest[body_start..body_start + end];
        let der = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            body.split_whitespace().collect::<String>(),
        )
        .map_err(|e| SigningError::Configuration(format!("invalid base64 in certificate: {e}")))?;
        let cert: Certificate = rasn::der::decode(&der)
            .map_err(|e| SigningError::Configuration(format!("invalid DER certificate: {e}")))?;
        certs.push(cert);
        rest = &rest[body_start + end + PEM_END.len()..];
    }
    if certs.is_empty() {
        return Err(SigningError::Configuration("no certificates found in chain".into()));
    }
    Ok(certs)
}

/// Drop a trailing self-signed root from `chain`, if one is present.
///
/// Windows builds the trust path from installed root stores, not from
/// whatever the signer happened to embed; shipping the root anyway only
/// grows the signature for no verification benefit, and ties the
/// signature to a root that may later be re-issued or revoked. A
/// self-signed certificate is detected structurally: `subject == issuer`.
/// Everything from that certificate onward is dropped (a well-formed
/// chain has at most one root, at the end). A lone self-signed leaf
/// (`chain.len() == 1`) is the one exception: it is embedded as-is rather
/// than trimmed to nothing, since there is no other certificate to stand
/// in for it.
pub fn trim_self_signed_root(mut chain: Vec<Certificate>) -> Vec<Certificate> {
    if chain.len() <= 1 {
        return chain;
    }
    if let Some(root_idx) = chain
        .iter()
        .position(|c| c.tbs_certificate.subject == c.tbs_certificate.issuer)
    {
        chain.truncate(root_idx);
    }
    chain
}

/// `SignerIdentifier::IssuerAndSerialNumber` for the leaf (first)
/// certificate in `chain`.
pub fn issuer_and_serial(leaf: &Certificate) -> IssuerAndSerialNumber {
    IssuerAndSerialNumber {
        issuer: leaf.tbs_certificate.issuer.clone(),
        serial_number: leaf.tbs_certificate.serial_number.clone(),
    }
}

/// A minimal self-signed certificate (`subject == issuer`), for tests
/// elsewhere in this crate that need a chain without caring about its
/// contents — signature verification is explicitly out of scope (§1).
#[cfg(test)]
pub(crate) fn self_signed_leaf_for_tests() -> Certificate {
    tests::cert(tests::name("test-leaf"), tests::name("test-leaf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasn::types::{Any, Integer, ObjectIdentifier, SetOf};
    use rasn_pkix::{
        AlgorithmIdentifier, AttributeTypeAndValue, Name, RdnSequence,
        RelativeDistinguishedName, SubjectPublicKeyInfo, TbsCertificate, Time, Validity, Version,
    };
    use rasn::types::BitString;

    /// A single-RDN name distinguished only by `cn`, enough to exercise
    /// the `subject == issuer` structural-equality heuristic.
    pub(super) fn name(cn: &str) -> Name {
        let mut rdn = SetOf::new();
        rdn.insert(AttributeTypeAndValue {
            r#type: ObjectIdentifier::new(vec![2, 5, 4, 3]), // commonName
            value: Any::new(cn.as_bytes().to_vec()),
        });
        Name::RdnSequence(RdnSequence(vec![RelativeDistinguishedName(rdn)]))
    }

    pub(super) fn cert(subject: Name, issuer: Name) -> Certificate {
        let tbs = TbsCertificate {
            version: Version(2),
            serial_number: Integer::from(1),
            signature: AlgorithmIdentifier {
                algorithm: ObjectIdentifier::new(vec![1, 2, 840, 113_549, 1, 1, 11]),
                parameters: None,
            },
            issuer,
            validity: Validity {
                not_before: Time::Utc(Default::default()),
                not_after: Time::Utc(Default::default()),
            },
            subject,
            subject_public_key_info: SubjectPublicKeyInfo {
                algorithm: AlgorithmIdentifier {
                    algorithm: ObjectIdentifier::new(vec![1, 2, 840, 113_549, 1, 1, 1]),
                    parameters: None,
                },
                subject_public_key: BitString::from_vec(vec![0]),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        };
        Certificate {
            tbs_certificate: tbs,
            signature_algorithm: AlgorithmIdentifier {
                algorithm: ObjectIdentifier::new(vec![1, 2, 840, 113_549, 1, 1, 11]),
                parameters: None,
            },
            signature_value: BitString::from_vec(vec![0]),
        }
    }

    #[test]
    fn trims_trailing_self_signed_root() {
        let leaf = cert(name("leaf"), name("intermediate"));
        let intermediate = cert(name("intermediate"), name("root"));
        let root = cert(name("root"), name("root"));
        let chain = vec![leaf, intermediate, root];

        let trimmed = trim_self_signed_root(chain);
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn leaves_chain_untouched_when_no_root_present() {
        let leaf = cert(name("leaf"), name("intermediate"));
        let intermediate = cert(name("intermediate"), name("ca"));
        let chain = vec![leaf, intermediate];

        let trimmed = trim_self_signed_root(chain);
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn lone_self_signed_leaf_is_kept_not_trimmed_to_nothing() {
        let leaf = cert(name("leaf"), name("leaf"));
        let trimmed = trim_self_signed_root(vec![leaf]);
        assert_eq!(trimmed.len(), 1);
    }
}

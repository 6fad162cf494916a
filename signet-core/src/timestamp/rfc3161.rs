//! RFC 3161 timestamping: a `TimeStampReq`/`TimeStampResp` exchange over
//! `application/timestamp-query`, distinct in wire format from the legacy
//! Authenticode protocol in [`crate::timestamp::authenticode`].

use rasn::types::{Integer, ObjectIdentifier, OctetString};
use rasn_cms::tsp::{MessageImprint, PkiStatus, TimeStampReq, TimeStampResp};
use rasn_pkix::AlgorithmIdentifier;
use reqwest::blocking::Client;

use rasn_cms::authenticode::SPC_RFC3161_OBJID;

use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;
use crate::timestamp::http::post_with_retries;
use crate::timestamp::{attach_unsigned_attribute, primary_signature_bytes, Timestamper};

const DEFAULT_URL: &str = "http://timestamp.digicert.com";
const CONTENT_TYPE_HEADER: &str = "application/timestamp-query";

/// Counter-signs through an RFC 3161 Time Stamp Authority. The request's
/// `messageImprint` hashes the primary signer's encrypted digest with the
/// active hash algorithm, not the encrypted digest itself.
pub struct Rfc3161Timestamper {
    url: String,
    client: Client,
}

impl Rfc3161Timestamper {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            client: Client::new(),
        }
    }
}

impl Default for Rfc3161Timestamper {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Timestamper for Rfc3161Timestamper {
    fn timestamp(&self, algorithm: HashAlgorithm, primary: rasn_cms::SignedData) -> Result<rasn_cms::SignedData> {
        let encrypted_digest = primary_signature_bytes(&primary)?;
        let imprint = algorithm.digest(&encrypted_digest);

        let request = TimeStampReq {
            version: 1,
            message_imprint: MessageImprint {
                hash_algorithm: AlgorithmIdentifier {
                    algorithm: algorithm.digest_oid().into(),
                    parameters: None,
                },
                hashed_message: OctetString::from(imprint),
            },
            req_policy: None,
            nonce: None,
            cert_req: true,
            extensions: None,
        };
        let request_der = rasn::der::encode(&request)
            .map_err(|e| SigningError::Crypto(format!("encoding TimeStampReq: {e}")))?;

        let response_der = post_with_retries(&self.client, &self.url, request_der, CONTENT_TYPE_HEADER)?;

        let response: TimeStampResp = rasn::der::decode(&response_der)
            .map_err(|e| SigningError::Timestamp(format!("timestamp response is not a valid TimeStampResp: {e}")))?;

        if response.status.status != PkiStatus::Granted && response.status.status != PkiStatus::GrantedWithMods {
            return Err(SigningError::Timestamp(format!(
                "TSA rejected the request: status {:?}",
                response.status.status
            )));
        }
        let time_stamp_token = response.time_stamp_token.ok_or_else(|| {
            SigningError::Timestamp("TSA response granted but carried no timeStampToken".into())
        })?;
        if time_stamp_token.content_type != ObjectIdentifier::from(rasn_cms::CONTENT_SIGNED_DATA) {
            return Err(SigningError::Timestamp(
                "TimeStampToken content type is not CMS SignedData".into(),
            ));
        }
        // Decoded only to validate structure before embedding verbatim.
        let _token_signed_data: rasn_cms::SignedData = rasn::der::decode(time_stamp_token.content.as_bytes())
            .map_err(|e| SigningError::Timestamp(format!("TimeStampToken SignedData is malformed: {e}")))?;

        let token_der = rasn::der::encode(&time_stamp_token)
            .map_err(|e| SigningError::Crypto(format!("re-encoding TimeStampToken: {e}")))?;

        attach_unsigned_attribute(primary, SPC_RFC3161_OBJID, token_der)
    }
}

//! Legacy Authenticode timestamping: a PKCS#7-wrapped request/response,
//! base64-encoded over a plain HTTP POST.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rasn::types::{Any, ObjectIdentifier, OctetString};
use rasn::{AsnType, Encode};
use rasn_cms::authenticode::SPC_TIME_STAMP_REQUEST_OBJID;
use rasn_cms::pkcs7_compat::SignedData as Pkcs7SignedData;
use rasn_cms::{ContentInfo, COUNTER_SIGNATURE};
use reqwest::blocking::Client;

use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;
use crate::timestamp::http::post_with_retries;
use crate::timestamp::{attach_unsigned_attribute, primary_signature_bytes, Timestamper};

const DEFAULT_URL: &str = "http://timestamp.comodoca.com/authenticode";
const CONTENT_TYPE_HEADER: &str = "application/octet-stream";

/// `TimeStampRequest ::= SEQUENCE { countersignatureType OBJECT IDENTIFIER,
/// content ContentInfo }`, the legacy (pre-RFC 3161) Authenticode request
/// shape: an `id-data` `ContentInfo` wrapping the primary signer's
/// encrypted digest as an OCTET STRING.
#[derive(AsnType, Encode)]
struct LegacyTimestampRequest {
    countersignature_type: ObjectIdentifier,
    content: ContentInfo,
}

/// Counter-signs through `http://timestamp.comodoca.com/authenticode` (or
/// an overridden URL) using the legacy, pre-RFC-3161 Authenticode
/// protocol.
pub struct AuthenticodeTimestamper {
    url: String,
    client: Client,
}

impl AuthenticodeTimestamper {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            client: Client::new(),
        }
    }
}

impl Default for AuthenticodeTimestamper {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Timestamper for AuthenticodeTimestamper {
    fn timestamp(&self, _algorithm: HashAlgorithm, primary: rasn_cms::SignedData) -> Result<rasn_cms::SignedData> {
        let encrypted_digest = primary_signature_bytes(&primary)?;

        let request = LegacyTimestampRequest {
            countersignature_type: SPC_TIME_STAMP_REQUEST_OBJID.into(),
            content: ContentInfo {
                content_type: rasn_cms::CONTENT_DATA.into(),
                content: Any::new(
                    rasn::der::encode(&OctetString::from(encrypted_digest))
                        .map_err(|e| SigningError::Crypto(format!("encoding timestamp request content: {e}")))?,
                ),
            },
        };
        let request_der = rasn::der::encode(&request)
            .map_err(|e| SigningError::Crypto(format!("encoding timestamp request: {e}")))?;
        let request_body = STANDARD.encode(request_der).into_bytes();

        let response_body = post_with_retries(&self.client, &self.url, request_body, CONTENT_TYPE_HEADER)?;

        let cleaned: Vec<u8> = response_body
            .into_iter()
            .filter(|b| !matches!(b, b'\r' | b'\n' | 0))
            .collect();
        let response_der = STANDARD
            .decode(cleaned)
            .map_err(|e| SigningError::Timestamp(format!("timestamp response is not valid base64: {e}")))?;

        let response: ContentInfo = rasn::der::decode(&response_der)
            .map_err(|e| SigningError::Timestamp(format!("timestamp response is not a valid ContentInfo: {e}")))?;
        if response.content_type != ObjectIdentifier::from(rasn_cms::CONTENT_SIGNED_DATA) {
            return Err(SigningError::Timestamp(
                "timestamp response content type is not PKCS#7 SignedData".into(),
            ));
        }
        // Decoded only to validate structure before embedding verbatim.
        let _token: Pkcs7SignedData = rasn::der::decode(response.content.as_bytes())
            .map_err(|e| SigningError::Timestamp(format!("timestamp response SignedData is malformed: {e}")))?;

        attach_unsigned_attribute(primary, COUNTER_SIGNATURE, response_der)
    }
}

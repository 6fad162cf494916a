//! The fixed set of Authenticode signed attributes.

use rasn::types::{Any, BmpString, Ia5String, ObjectIdentifier, SequenceOf, SetOf};
use rasn::{AsnType, Decode, Encode};
use rasn_cms::authenticode::{SpcLink, SpcSpOpusInfo, SpcString};
use rasn_pkix::Attribute;

use crate::error::{Result, SigningError};
use crate::spc::oids::SPC_INDIVIDUAL_SP_KEY_PURPOSE_OBJID;

/// `SPC_STATEMENT_TYPE_OBJID` (1.3.6.1.4.1.311.2.1.11), which
/// `rasn_cms::authenticode` already exports.
pub use rasn_cms::authenticode::SPC_STATEMENT_TYPE_OBJID;
pub use rasn_cms::authenticode::SPC_SP_OPUS_INFO_OBJID;

/// `SpcStatementType ::= SEQUENCE OF OBJECT IDENTIFIER`. Not modeled by
/// `rasn_cms::authenticode`, which only carries the OID constant for the
/// attribute type itself; this is the attribute *value*.
#[derive(AsnType, Clone, Debug, Decode, Encode, PartialEq, Eq)]
#[rasn(delegate)]
pub struct SpcStatementType(pub SequenceOf<ObjectIdentifier>);

impl SpcStatementType {
    /// The only kind this crate ever emits: ordinary code signing.
    pub fn individual_code_signing() -> Self {
        Self(vec![SPC_INDIVIDUAL_SP_KEY_PURPOSE_OBJID.into()])
    }
}

/// Both halves of the optional `SpcSpOpusInfo` payload. `None`/`None` means
/// the attribute is omitted entirely, per §4.2.
#[derive(Debug, Clone, Default)]
pub struct ProgramInfo {
    pub name: Option<String>,
    pub url: Option<String>,
}

fn attribute_with_single_value(oid: &rasn::types::Oid, value: Any) -> Attribute {
    let mut values = SetOf::new();
    values.insert(value);
    Attribute {
        r#type: oid.into(),
        values,
    }
}

fn encode_any<T: Encode>(value: &T) -> Result<Any> {
    let der = rasn::der::encode(value)
        .map_err(|e| SigningError::Crypto(format!("encoding authenticated attribute: {e}")))?;
    Ok(Any::new(der))
}

/// Build the authenticated-attribute set per §4.2: a mandatory
/// `SpcStatementType` attribute, plus an `SpcSpOpusInfo` attribute iff
/// `program.name` or `program.url` is set. The standard CMS `contentType`
/// and `messageDigest` attributes are added by the signed-data generator,
/// not here.
pub fn build_authenticated_attributes(program: &ProgramInfo) -> Result<Vec<Attribute>> {
    let mut attrs = Vec::with_capacity(2);

    attrs.push(attribute_with_single_value(
        SPC_STATEMENT_TYPE_OBJID,
        encode_any(&SpcStatementType::individual_code_signing())?,
    ));

    if program.name.is_some() || program.url.is_some() {
        let program_name = program
            .name
            .as_deref()
            .map(|n| -> Result<SpcString> {
                Ok(SpcString::Unicode(BmpString::try_from(n).map_err(|e| {
                    SigningError::Configuration(format!("programName not representable in UTF-16: {e}"))
                })?))
            })
            .transpose()?;
        let more_info = program
            .url
            .as_deref()
            .map(|u| -> Result<SpcLink> {
                Ok(SpcLink::Url(Ia5String::try_from(u).map_err(|e| {
                    SigningError::Configuration(format!("programURL is not IA5-representable: {e}"))
                })?))
            })
            .transpose()?;

        let opus = SpcSpOpusInfo {
            program_name,
            more_info,
        };
        attrs.push(attribute_with_single_value(
            SPC_SP_OPUS_INFO_OBJID,
            encode_any(&opus)?,
        ));
    }

    Ok(attrs)
}

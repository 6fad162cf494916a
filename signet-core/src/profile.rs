//! File-based configuration for [`crate::signer::SignerBuilder`].
//!
//! Mirrors the everything-but-secrets knobs on [`crate::signer::SignerBuilder`].
//! The private key and certificate chain are never modeled here: key/cert
//! acquisition stays an external collaborator, and a TOML file on disk is
//! not an acceptable place to park key material. `deny_unknown_fields`
//! makes that a hard error rather than a silently-ignored field if a
//! profile ever tries.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningProfile {
    /// `"SHA-1"` / `"SHA-256"` (any spelling [`crate::hash::HashAlgorithm::parse`]
    /// accepts). Absent means the builder's own default applies.
    pub hash_algorithm: Option<String>,
    pub program_name: Option<String>,
    pub program_url: Option<String>,
    pub timestamping: Option<bool>,
    pub use_rfc3161: Option<bool>,
    pub timestamp_url: Option<String>,
}

impl SigningProfile {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_full_profile() {
        let s = r#"
            hash_algorithm = "SHA-256"
            program_name = "My App"
            program_url = "https://example.com"
            timestamping = true
            use_rfc3161 = true
            timestamp_url = "http://tsa.example.test"
        "#;
        let p = SigningProfile::from_toml_str(s).expect("valid profile");
        assert_eq!(p.hash_algorithm.as_deref(), Some("SHA-256"));
        assert_eq!(p.program_name.as_deref(), Some("My App"));
        assert_eq!(p.program_url.as_deref(), Some("https://example.com"));
        assert_eq!(p.timestamping, Some(true));
        assert_eq!(p.use_rfc3161, Some(true));
        assert_eq!(p.timestamp_url.as_deref(), Some("http://tsa.example.test"));
    }

    #[test]
    fn every_field_is_optional() {
        let p = SigningProfile::from_toml_str("").expect("empty profile is valid");
        assert!(p.hash_algorithm.is_none());
        assert!(p.program_name.is_none());
        assert!(p.timestamping.is_none());
    }

    #[test]
    fn never_models_key_or_chain_fields() {
        // A profile carrying key material is rejected outright, not
        // silently ignored — there is no field for it to land in, and
        // `deny_unknown_fields` turns the typo/smuggling case into an error.
        let s = r#"private_key = "/path/to/key.pem""#;
        assert!(SigningProfile::from_toml_str(s).is_err());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use signet_core::cms::{parse_pem_chain, SigningKey};
use signet_core::profile::SigningProfile;
use signet_core::signer::SignerBuilder;

/// Embed an Authenticode signature into a PE image, in place.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// PE file to sign. Modified in place; the prior Certificate Table,
    /// if any, is replaced.
    pub file: PathBuf,

    /// PEM bundle of the signing certificate chain, leaf first.
    #[arg(long)]
    pub chain: PathBuf,

    /// PKCS#8 PEM private key matching the leaf certificate (RSA or
    /// P-256 ECDSA).
    #[arg(long)]
    pub key: PathBuf,

    /// TOML file supplying the non-secret options below as defaults.
    /// Explicit flags on this command line override it.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// "SHA-1" or "SHA-256". Defaults to SHA-256.
    #[arg(long)]
    pub hash_algorithm: Option<String>,

    /// `programName` in the embedded `SpcSpOpusInfo` attribute.
    #[arg(long)]
    pub program_name: Option<String>,

    /// `programURL` in the embedded `SpcSpOpusInfo` attribute.
    #[arg(long)]
    pub program_url: Option<String>,

    /// Disable counter-signature acquisition.
    #[arg(long)]
    pub no_timestamping: bool,

    /// Use RFC 3161 timestamping instead of the legacy Authenticode
    /// protocol.
    #[arg(long)]
    pub use_rfc3161: bool,

    /// Override the timestamp server URL.
    #[arg(long)]
    pub timestamp_url: Option<String>,
}

impl SignArgs {
    pub fn run(self) -> Result<()> {
        let chain_pem = std::fs::read_to_string(&self.chain)
            .with_context(|| format!("reading certificate chain {}", self.chain.display()))?;
        let chain = parse_pem_chain(&chain_pem).context("parsing certificate chain")?;

        let key_pem = std::fs::read_to_string(&self.key)
            .with_context(|| format!("reading private key {}", self.key.display()))?;
        let key = SigningKey::from_pkcs8_pem(&key_pem).context("parsing private key")?;

        let mut builder = SignerBuilder::new().chain(chain).private_key(key);

        if let Some(profile_path) = &self.profile {
            let profile_toml = std::fs::read_to_string(profile_path)
                .with_context(|| format!("reading profile {}", profile_path.display()))?;
            let profile = SigningProfile::from_toml_str(&profile_toml)
                .with_context(|| format!("parsing profile {}", profile_path.display()))?;
            builder = builder.apply_profile(&profile);
        }

        if let Some(hash_algorithm) = self.hash_algorithm {
            builder = builder.hash_algorithm(hash_algorithm);
        }
        if let Some(program_name) = self.program_name {
            builder = builder.program_name(program_name);
        }
        if let Some(program_url) = self.program_url {
            builder = builder.program_url(program_url);
        }
        if self.no_timestamping {
            builder = builder.timestamping(false);
        }
        if self.use_rfc3161 {
            builder = builder.use_rfc3161(true);
        }
        if let Some(timestamp_url) = self.timestamp_url {
            builder = builder.timestamp_url(timestamp_url);
        }

        let signer = builder.build().context("building signer")?;
        signer.sign(&self.file).context("signing PE image")?;

        tracing::info!(file = %self.file.display(), "signed");
        Ok(())
    }
}

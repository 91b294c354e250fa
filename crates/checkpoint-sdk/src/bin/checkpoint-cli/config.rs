//! Configuration handling for checkpoint-cli
//!
//! Priority: CLI flags > environment variables > config file > defaults

use anyhow::{Context, Result};
use checkpoint_core::bitmap::BitmapConvention;
use checkpoint_core::config::{domain_from_label, Quorum, DEFAULT_DOMAIN_LABEL};
use checkpoint_core::types::Digest;
use checkpoint_core::{SignedMessage, VerifierConfig};
use checkpoint_verifier_sdk::{decode_hex_array, CheckpointClient, DEFAULT_WORKERS};
use serde::Deserialize;
use std::{fs, path::PathBuf};

/// Resolved configuration for CLI commands
pub struct Config {
    pub chain_id: Option<u64>,
    pub domain: Digest,
    pub convention: BitmapConvention,
    pub quorum: Quorum,
    pub signed_message: SignedMessage,
    pub strict_bitmap_length: bool,
    pub workers: usize,
    pub quiet: bool,
    pub json_output: bool,
}

impl Config {
    /// Load configuration from file, environment, and CLI args
    pub fn load(common: &super::CommonArgs) -> Result<Self> {
        let file_config = ConfigFile::load().ok();
        let file_default = file_config.as_ref().and_then(|c| c.default.as_ref());

        let chain_id = common
            .chain_id
            .or_else(|| file_default.and_then(|d| d.chain_id));

        let domain = match common
            .domain
            .as_deref()
            .or_else(|| file_default.and_then(|d| d.domain.as_deref()))
        {
            Some(domain) => parse_domain(domain)?,
            None => domain_from_label(DEFAULT_DOMAIN_LABEL),
        };

        let convention = match common
            .convention
            .as_deref()
            .or_else(|| file_default.and_then(|d| d.convention.as_deref()))
        {
            Some(convention) => convention
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown bitmap convention {convention:?}"))?,
            None => BitmapConvention::NonSigners,
        };

        let signed_message = match common
            .message
            .as_deref()
            .or_else(|| file_default.and_then(|d| d.message.as_deref()))
        {
            Some(message) => message
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown signed message {message:?}"))?,
            None => SignedMessage::default(),
        };

        let verification = file_config.as_ref().and_then(|c| c.verification.as_ref());
        let quorum = match verification.and_then(|v| v.quorum) {
            Some([numerator, denominator]) => Quorum::new(numerator, denominator)
                .with_context(|| {
                    format!("Quorum {numerator}/{denominator} must be in (0, 1]")
                })?,
            None => Quorum::default(),
        };

        Ok(Self {
            chain_id,
            domain,
            convention,
            quorum,
            signed_message,
            strict_bitmap_length: verification
                .and_then(|v| v.strict_bitmap_length)
                .unwrap_or(false),
            workers: verification
                .and_then(|v| v.workers)
                .unwrap_or(DEFAULT_WORKERS),
            quiet: common.quiet,
            json_output: common.output == super::OutputFormat::Json,
        })
    }

    /// Verifier parameters, using `fallback_chain_id` when none was configured
    pub fn verifier_config(&self, fallback_chain_id: u64) -> VerifierConfig {
        VerifierConfig::new(
            self.chain_id.unwrap_or(fallback_chain_id),
            self.domain,
            self.convention,
        )
        .with_quorum(self.quorum)
        .with_signed_message(self.signed_message)
        .with_strict_bitmap_length(self.strict_bitmap_length)
    }

    pub fn client(&self, fallback_chain_id: u64) -> CheckpointClient {
        CheckpointClient::new(self.verifier_config(fallback_chain_id)).with_workers(self.workers)
    }

    /// Print a progress line unless output is quiet or JSON
    pub fn human(&self) -> bool {
        !self.quiet && !self.json_output
    }
}

/// A label, or an explicit 32-byte domain in hex
fn parse_domain(domain: &str) -> Result<Digest> {
    if domain.starts_with("0x") {
        decode_hex_array("domain", domain).context("Domain must be 32 bytes of hex")
    } else {
        Ok(domain_from_label(domain))
    }
}

/// Configuration file structure
#[derive(Debug, Deserialize)]
struct ConfigFile {
    default: Option<DefaultConfig>,
    verification: Option<VerificationConfig>,
}

#[derive(Debug, Deserialize)]
struct DefaultConfig {
    chain_id: Option<u64>,
    domain: Option<String>,
    convention: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerificationConfig {
    /// [numerator, denominator]
    quorum: Option<[u32; 2]>,
    strict_bitmap_length: Option<bool>,
    workers: Option<usize>,
}

impl ConfigFile {
    fn load() -> Result<Self> {
        let path = config_file_path()?;
        if !path.exists() {
            anyhow::bail!("Config file not found");
        }
        let content = fs::read_to_string(&path)?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        log::debug!("loaded config from {:?}", path);
        Ok(config)
    }
}

/// Get config file path
fn config_file_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not find config directory")?;
    Ok(config_dir.join("checkpoint-verifier").join("config.toml"))
}

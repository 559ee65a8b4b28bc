use std::{fs, path::Path, str::FromStr};

use lb_core::MAX_BIN_ARRAYS_PER_SWAP;
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::errors::{SdkError, SdkResult};

const COMMITMENTS: [&str; 3] = ["processed", "confirmed", "finalized"];

/// SDK configuration, loadable from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SdkConfig {
    /// RPC endpoint URL
    pub rpc_url: String,

    /// WebSocket URL for subscriptions
    pub ws_url: Option<String>,

    /// Transaction commitment level
    pub commitment: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Zap program ID
    #[serde(with = "pubkey_serde")]
    pub zap_program_id: Pubkey,

    /// Liquidity book program ID
    #[serde(with = "pubkey_serde")]
    pub lb_program_id: Pubkey,

    /// Bin arrays attached to each liquidity book swap
    pub bin_arrays_per_swap: usize,

    /// Default tracing filter
    pub log_level: String,
}

impl SdkConfig {
    fn with_urls(rpc_url: &str, ws_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            ws_url: Some(ws_url.to_string()),
            commitment: "confirmed".to_string(),
            timeout_secs: 30,
            zap_program_id: zap::ID,
            lb_program_id: zap::constants::program_id::LB_CLMM,
            bin_arrays_per_swap: 3,
            log_level: "info".to_string(),
        }
    }

    pub fn localnet() -> Self {
        Self::with_urls("http://localhost:8899", "ws://localhost:8900")
    }

    pub fn devnet() -> Self {
        Self::with_urls("https://api.devnet.solana.com", "wss://api.devnet.solana.com")
    }

    pub fn mainnet() -> Self {
        Self::with_urls(
            "https://api.mainnet-beta.solana.com",
            "wss://api.mainnet-beta.solana.com",
        )
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    pub fn with_zap_program_id(mut self, program_id: Pubkey) -> Self {
        self.zap_program_id = program_id;
        self
    }

    pub fn with_lb_program_id(mut self, program_id: Pubkey) -> Self {
        self.lb_program_id = program_id;
        self
    }

    pub fn with_bin_arrays_per_swap(mut self, count: usize) -> Self {
        self.bin_arrays_per_swap = count;
        self
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: SdkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> SdkResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.rpc_url.is_empty() {
            return Err(SdkError::InvalidConfig("rpc_url is empty".to_string()));
        }
        if matches!(&self.ws_url, Some(url) if url.is_empty()) {
            return Err(SdkError::InvalidConfig("ws_url is empty".to_string()));
        }
        if !COMMITMENTS.contains(&self.commitment.as_str()) {
            return Err(SdkError::InvalidConfig(format!(
                "commitment {} is not one of {:?}",
                self.commitment, COMMITMENTS
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SdkError::InvalidConfig("timeout_secs must be greater than 0".to_string()));
        }
        if !(1..=MAX_BIN_ARRAYS_PER_SWAP).contains(&self.bin_arrays_per_swap) {
            return Err(SdkError::InvalidConfig(format!(
                "bin_arrays_per_swap {} is outside 1..={}",
                self.bin_arrays_per_swap, MAX_BIN_ARRAYS_PER_SWAP
            )));
        }
        Ok(())
    }

    pub fn commitment_config(&self) -> SdkResult<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| SdkError::InvalidConfig(format!("unknown commitment {}", self.commitment)))
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self::localnet()
    }
}

mod pubkey_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

//! Deployment settings for the collaborator clients.

use serde::{Deserialize, Serialize};

/// Address of the deployed medical-records contract.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x818FC828b579910ec415d606e4EA34B380cF1d06";

pub const ENV_CONTRACT_ADDRESS: &str = "MEDCHAIN_CONTRACT_ADDRESS";
pub const ENV_RPC_URL: &str = "MEDCHAIN_RPC_URL";
pub const ENV_DATABASE_URL: &str = "MEDCHAIN_DATABASE_URL";
pub const ENV_GATEWAY_URL: &str = "MEDCHAIN_GATEWAY_URL";

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid contract address `{0}`: expected 0x followed by 40 hex digits")]
    InvalidContractAddress(String),
    #[error("invalid configuration document: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default = "default_contract_address")]
    pub contract_address: String,
    /// Fallback RPC endpoint when no wallet provider is injected.
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub gateway_url: Option<String>,
}

fn default_contract_address() -> String {
    DEFAULT_CONTRACT_ADDRESS.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract_address: default_contract_address(),
            rpc_url: None,
            database_url: None,
            gateway_url: None,
        }
    }
}

impl Config {
    /// Reads `MEDCHAIN_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let config = Self {
            contract_address: get(ENV_CONTRACT_ADDRESS).unwrap_or_else(default_contract_address),
            rpc_url: get(ENV_RPC_URL),
            database_url: get(ENV_DATABASE_URL),
            gateway_url: get(ENV_GATEWAY_URL),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let addr = self.contract_address.trim();
        let valid = addr.len() == 42
            && addr.starts_with("0x")
            && addr[2..].chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidContractAddress(
                self.contract_address.clone(),
            ))
        }
    }
}

//! Configuration management: `Config.toml` plus environment overrides.

use anyhow::{Context, Result};
use config::{Config, ConfigError, File};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    #[serde(default = "default_rpc_http_url")]
    pub http_url: String,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_rpc_http_url() -> String {
    "http://localhost:8545".to_string()
}
fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            http_url: default_rpc_http_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ContractSettings {
    /// Protocol storage contract (the root of contract-name resolution).
    #[serde(default)]
    pub storage: String,
    /// Multicall3 deployment.
    #[serde(default)]
    pub multicall: String,
    /// Optional pinned addresses by logical name, bypassing on-chain resolution.
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl ContractSettings {
    pub fn storage_address(&self) -> Result<Address> {
        self.storage
            .parse()
            .with_context(|| format!("invalid storage address '{}'", self.storage))
    }

    pub fn multicall_address(&self) -> Result<Address> {
        self.multicall
            .parse()
            .with_context(|| format!("invalid multicall address '{}'", self.multicall))
    }

    /// Parsed override map; entries with unparseable addresses are rejected.
    pub fn parsed_overrides(&self) -> Result<Vec<(String, Address)>> {
        self.overrides
            .iter()
            .map(|(name, raw)| {
                let address: Address = raw
                    .parse()
                    .with_context(|| format!("invalid override address '{raw}' for '{name}'"))?;
                Ok((name.clone(), address))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateFetchSettings {
    /// Nodes per detail-fetch chunk (each node costs ~20 batched reads).
    #[serde(default = "default_node_batch_size")]
    pub node_batch_size: usize,
    /// Indices per address-resolution chunk (one read per index).
    #[serde(default = "default_address_batch_size")]
    pub address_batch_size: usize,
    /// Global cap on concurrently running chunk workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Calls per aggregate3 invocation before the multicall chunks internally.
    #[serde(default = "default_multicall_batch_size")]
    pub multicall_batch_size: usize,
}

fn default_node_batch_size() -> usize {
    200
}
fn default_address_batch_size() -> usize {
    2000
}
fn default_concurrency() -> usize {
    12
}
fn default_multicall_batch_size() -> usize {
    500
}

impl Default for StateFetchSettings {
    fn default() -> Self {
        Self {
            node_batch_size: default_node_batch_size(),
            address_batch_size: default_address_batch_size(),
            concurrency: default_concurrency(),
            multicall_batch_size: default_multicall_batch_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub contracts: ContractSettings,
    #[serde(default)]
    pub state_fetch: StateFetchSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let s = Config::builder()
            .add_source(File::with_name("Config.toml").required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Environment variable overrides
        if let Ok(url) = env::var("STAKENET_RPC_HTTP_URL") {
            if !url.trim().is_empty() {
                settings.rpc.http_url = url;
            }
        }
        if let Ok(storage) = env::var("STAKENET_CONTRACTS_STORAGE") {
            if !storage.trim().is_empty() {
                settings.contracts.storage = storage;
            }
        }
        if let Ok(multicall) = env::var("STAKENET_CONTRACTS_MULTICALL") {
            if !multicall.trim().is_empty() {
                settings.contracts.multicall = multicall;
            }
        }
        if let Ok(concurrency) = env::var("STAKENET_STATE_CONCURRENCY") {
            if let Ok(value) = concurrency.trim().parse() {
                settings.state_fetch.concurrency = value;
            }
        }

        // Optional: contract address overrides via ENV (JSON: { name: address })
        if let Ok(raw_overrides) = env::var("STAKENET_CONTRACT_OVERRIDES") {
            let trimmed = raw_overrides.trim();
            if !trimmed.is_empty() {
                match serde_json::from_str::<HashMap<String, String>>(trimmed) {
                    Ok(map) => {
                        for (name, address) in map {
                            if !name.trim().is_empty() && !address.trim().is_empty() {
                                settings.contracts.overrides.insert(name, address);
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("Failed to parse STAKENET_CONTRACT_OVERRIDES as JSON: {}", e);
                    }
                }
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_batch_sizes() {
        let state_fetch = StateFetchSettings::default();
        assert_eq!(state_fetch.node_batch_size, 200);
        assert_eq!(state_fetch.address_batch_size, 2000);
        assert!(state_fetch.concurrency > 0);
    }

    #[test]
    fn test_override_parsing_rejects_bad_address() {
        let mut contracts = ContractSettings::default();
        contracts
            .overrides
            .insert("nodeManager".to_string(), "not-an-address".to_string());
        assert!(contracts.parsed_overrides().is_err());
    }

    #[test]
    fn test_override_parsing_accepts_valid_address() {
        let mut contracts = ContractSettings::default();
        contracts.overrides.insert(
            "nodeManager".to_string(),
            "0x1111111111111111111111111111111111111111".to_string(),
        );
        let parsed = contracts.parsed_overrides().unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "nodeManager");
    }
}

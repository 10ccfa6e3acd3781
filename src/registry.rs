//! Token registry: which symbols exist on which network, and their contract metadata.
//!
//! The registry is immutable once built. It is handed to the recipient ledger and the
//! dispatch engine (usually behind an `Arc`) so tests can swap in their own tables.

use crate::config::Network;
use crate::error::{Error, Result};
use crate::types::TokenInfo;
use crate::utils::MAX_DECIMALS;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

const BUILTIN_REGISTRY_JSON: &str = include_str!("builtin_tokens.json");

static BUILTIN_REGISTRY: OnceLock<TokenRegistry> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    pub address: Option<Address>,
    pub decimals: u8,
}

impl TokenEntry {
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            address: self.address,
            decimals: self.decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTokens {
    pub network: Network,
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRegistry {
    networks: Vec<NetworkTokens>,
}

impl TokenRegistry {
    /// Build a registry from per-network token tables, rejecting empty or repeated symbols
    /// and precisions too large to scale amounts with.
    pub fn new(networks: Vec<NetworkTokens>) -> Result<Self> {
        let mut seen_networks = HashSet::new();
        for table in &networks {
            if !seen_networks.insert(table.network) {
                return Err(Error::InvalidRegistry(format!(
                    "network {} is listed more than once",
                    table.network
                )));
            }
            let mut seen_symbols = HashSet::new();
            for entry in &table.tokens {
                if entry.symbol.trim().is_empty() {
                    return Err(Error::InvalidRegistry(format!(
                        "empty token symbol on {}",
                        table.network
                    )));
                }
                if entry.decimals > MAX_DECIMALS {
                    return Err(Error::InvalidRegistry(format!(
                        "token {} on {} has {} decimals (at most {} supported)",
                        entry.symbol, table.network, entry.decimals, MAX_DECIMALS
                    )));
                }
                if !seen_symbols.insert(entry.symbol.as_str()) {
                    return Err(Error::InvalidRegistry(format!(
                        "token {} is listed more than once on {}",
                        entry.symbol, table.network
                    )));
                }
            }
        }
        Ok(Self { networks })
    }

    /// The registry shipped with the crate.
    pub fn builtin() -> Self {
        BUILTIN_REGISTRY
            .get_or_init(|| {
                Self::from_json(BUILTIN_REGISTRY_JSON)
                    .expect("builtin_tokens.json is invalid - this is a programming error")
            })
            .clone()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct RegistryFile {
            networks: Vec<NetworkTokens>,
        }

        let file: RegistryFile = serde_json::from_str(text)?;
        Self::new(file.networks)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let registry = Self::from_json(&text)?;
        info!("Loaded token registry from {:?}", path);
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn tokens(&self, network: Network) -> &[TokenEntry] {
        self.networks
            .iter()
            .find(|t| t.network == network)
            .map(|t| t.tokens.as_slice())
            .unwrap_or(&[])
    }

    /// Every registered symbol on `network` in declared order.
    pub fn symbols(&self, network: Network) -> Vec<String> {
        self.tokens(network).iter().map(|e| e.symbol.clone()).collect()
    }

    /// Registered symbols on `network` that are not in `excluded`, in declared order.
    pub fn available_tokens<S: AsRef<str>>(&self, network: Network, excluded: &[S]) -> Vec<String> {
        let excluded: HashSet<&str> = excluded.iter().map(|s| s.as_ref()).collect();
        self.tokens(network)
            .iter()
            .filter(|e| !excluded.contains(e.symbol.as_str()))
            .map(|e| e.symbol.clone())
            .collect()
    }

    pub fn contains(&self, network: Network, symbol: &str) -> bool {
        self.tokens(network).iter().any(|e| e.symbol == symbol)
    }

    pub fn resolve(&self, network: Network, symbol: &str) -> Result<TokenInfo> {
        self.tokens(network)
            .iter()
            .find(|e| e.symbol == symbol)
            .map(TokenEntry::info)
            .ok_or_else(|| Error::UnknownToken {
                network,
                symbol: symbol.to_string(),
            })
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

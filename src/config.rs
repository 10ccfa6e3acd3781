use crate::error::{Error, Result};
use crate::registry::TokenRegistry;
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Decimal precision of the native asset on every supported chain.
pub const NATIVE_DECIMALS: u8 = 18;

/// A supported EVM network. The set is closed: each variant has its own token registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Ethereum,
    Base,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Ethereum, Network::Base];

    pub fn label(&self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Base => "Base",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Base => 8453,
        }
    }

    pub fn native_token(&self) -> &'static str {
        "ETH"
    }

    pub fn native_decimals(&self) -> u8 {
        NATIVE_DECIMALS
    }

    pub fn default_rpc(&self) -> &'static str {
        match self {
            Network::Ethereum => "https://ethereum-rpc.publicnode.com",
            Network::Base => "https://mainnet.base.org",
        }
    }

    /// Base URL of the block explorer for transaction/address lookups
    pub fn block_explorer_url(&self) -> &'static str {
        match self {
            Network::Ethereum => "https://etherscan.io",
            Network::Base => "https://basescan.org",
        }
    }

    pub fn tx_explorer_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.block_explorer_url(), tx_hash)
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Network> {
        Network::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::Ethereum
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Network::ALL
            .into_iter()
            .find(|n| n.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::Config(format!("unsupported network '{wanted}'")))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub network: Network,
    pub rpc_url: String,
    /// Blocks to wait for after each submission (0 = accepted by the node is enough)
    pub confirmations: usize,
    /// Token registry file replacing the built-in registry
    pub registry_path: Option<PathBuf>,
    /// Operation log location override
    pub log_path: Option<PathBuf>,
}

impl Config {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            rpc_url: network.default_rpc().to_string(),
            confirmations: 0,
            registry_path: None,
            log_path: None,
        }
    }

    /// Build the configuration from process environment variables.
    ///
    /// `MULTISEND_NETWORK`, `RPC_URL`, `MULTISEND_CONFIRMATIONS`, `TOKEN_REGISTRY` and
    /// `OPERATION_LOG` are all optional.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub(crate) fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let network = match non_empty("MULTISEND_NETWORK") {
            Some(name) => name.parse()?,
            None => Network::default(),
        };

        let mut config = Self::new(network);

        if let Some(rpc) = non_empty("RPC_URL") {
            config = config.with_rpc_url(rpc)?;
        }

        if let Some(raw) = non_empty("MULTISEND_CONFIRMATIONS") {
            config.confirmations = raw.trim().parse().map_err(|_| {
                Error::Config(format!("MULTISEND_CONFIRMATIONS must be a whole number, got '{raw}'"))
            })?;
        }

        config.registry_path = non_empty("TOKEN_REGISTRY").map(PathBuf::from);
        config.log_path = non_empty("OPERATION_LOG").map(PathBuf::from);

        Ok(config)
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Result<Self> {
        let rpc_url = rpc_url.into();
        Url::parse(rpc_url.trim())
            .map_err(|e| Error::Config(format!("invalid RPC URL '{rpc_url}': {e}")))?;
        self.rpc_url = rpc_url.trim().to_string();
        Ok(self)
    }

    /// Switching network also resets the RPC endpoint to the new network's default.
    pub fn with_network(mut self, network: Network) -> Self {
        if self.rpc_url == self.network.default_rpc() {
            self.rpc_url = network.default_rpc().to_string();
        }
        self.network = network;
        self
    }

    pub fn native_token(&self) -> &str {
        self.network.native_token()
    }

    pub fn network_label(&self) -> &str {
        self.network.label()
    }

    pub fn get_provider(&self) -> Result<Provider<Http>> {
        let url = Url::parse(&self.rpc_url)
            .map_err(|e| Error::Config(format!("invalid RPC URL '{}': {e}", self.rpc_url)))?;
        Provider::<Http>::try_from(url.as_str())
            .map_err(|e| Error::Config(format!("cannot create provider: {e}")))
    }

    /// The configured registry file, or the built-in registry when none is set.
    pub fn registry(&self) -> Result<TokenRegistry> {
        match &self.registry_path {
            Some(path) => TokenRegistry::load(path),
            None => Ok(TokenRegistry::builtin()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ==================== Network tests ====================

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(Network::Ethereum.chain_id(), 1);
        assert_eq!(Network::Base.chain_id(), 8453);
    }

    #[test]
    fn test_network_from_chain_id() {
        assert_eq!(Network::from_chain_id(8453), Some(Network::Base));
        assert_eq!(Network::from_chain_id(999999), None);
    }

    #[test]
    fn test_network_parse_is_case_insensitive() {
        assert_eq!("base".parse::<Network>().unwrap(), Network::Base);
        assert_eq!(" ETHEREUM ".parse::<Network>().unwrap(), Network::Ethereum);
    }

    #[test]
    fn test_network_parse_unknown_fails() {
        let err = "Polygon".parse::<Network>().unwrap_err();
        assert!(err.to_string().contains("unsupported network"));
    }

    #[test]
    fn test_network_native_decimals() {
        for network in Network::ALL {
            assert_eq!(network.native_decimals(), 18);
            assert_eq!(network.native_token(), "ETH");
        }
    }

    #[test]
    fn test_tx_explorer_url() {
        assert_eq!(
            Network::Base.tx_explorer_url("0xabc"),
            "https://basescan.org/tx/0xabc"
        );
    }

    // ==================== Config tests ====================

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.network, Network::Ethereum);
        assert_eq!(config.rpc_url, "https://ethereum-rpc.publicnode.com");
        assert_eq!(config.confirmations, 0);
        assert!(config.registry_path.is_none());
    }

    #[test]
    fn test_config_from_vars_empty() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.network, Network::Ethereum);
        assert_eq!(config.rpc_url, Network::Ethereum.default_rpc());
    }

    #[test]
    fn test_config_from_vars_full() {
        let config = Config::from_vars(vars(&[
            ("MULTISEND_NETWORK", "Base"),
            ("RPC_URL", "https://base.example.org"),
            ("MULTISEND_CONFIRMATIONS", "2"),
            ("TOKEN_REGISTRY", "/tmp/tokens.json"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Base);
        assert_eq!(config.rpc_url, "https://base.example.org");
        assert_eq!(config.confirmations, 2);
        assert_eq!(config.registry_path, Some(PathBuf::from("/tmp/tokens.json")));
        assert!(config.log_path.is_none());
    }

    #[test]
    fn test_config_from_vars_network_sets_default_rpc() {
        let config = Config::from_vars(vars(&[("MULTISEND_NETWORK", "base")])).unwrap();
        assert_eq!(config.rpc_url, "https://mainnet.base.org");
    }

    #[test]
    fn test_config_from_vars_bad_confirmations() {
        let result = Config::from_vars(vars(&[("MULTISEND_CONFIRMATIONS", "soon")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_bad_rpc_url() {
        let result = Config::default().with_rpc_url("not a url");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_with_network_keeps_custom_rpc() {
        let config = Config::default()
            .with_rpc_url("http://localhost:8545")
            .unwrap()
            .with_network(Network::Base);
        assert_eq!(config.network, Network::Base);
        assert_eq!(config.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_config_with_network_switches_default_rpc() {
        let config = Config::default().with_network(Network::Base);
        assert_eq!(config.rpc_url, Network::Base.default_rpc());
        assert_eq!(config.network_label(), "Base");
    }

    #[test]
    fn test_config_registry_defaults_to_builtin() {
        let registry = Config::default().registry().unwrap();
        assert!(registry.contains(Network::Ethereum, "USDC"));
    }

    #[test]
    fn test_config_get_provider() {
        assert!(Config::default().get_provider().is_ok());
    }
}

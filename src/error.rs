//! Error type shared by the registry, recipient ledger, CSV codec and dispatch engine.

use crate::config::Network;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No active signer when a dispatch was requested.
    #[error("wallet not connected")]
    NotConnected,

    #[error("token {symbol} is not available on {network}")]
    UnknownToken { network: Network, symbol: String },

    #[error("invalid amount '{amount}': {reason}")]
    AmountParse { amount: String, reason: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid recipient address '{0}'")]
    InvalidAddress(String),

    /// The signer is connected to a different chain than the selected network.
    #[error("signer is on {}, expected {network} (chain {expected})", describe_chain(*.actual))]
    WrongNetwork {
        network: Network,
        expected: u64,
        actual: u64,
    },

    /// Transport, signing or on-chain failure reported by the wallet/provider.
    #[error("{0}")]
    Signer(String),

    #[error("invalid token registry: {0}")]
    InvalidRegistry(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// "Base (chain 8453)" for a supported chain, "chain 137" otherwise.
fn describe_chain(chain_id: u64) -> String {
    match Network::from_chain_id(chain_id) {
        Some(network) => format!("{network} (chain {chain_id})"),
        None => format!("chain {chain_id}"),
    }
}

impl Error {
    pub fn signer(message: impl Into<String>) -> Self {
        Self::Signer(message.into())
    }

    pub fn amount_parse(amount: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AmountParse {
            amount: amount.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_network_names_known_chain() {
        let err = Error::WrongNetwork {
            network: Network::Ethereum,
            expected: 1,
            actual: 8453,
        };
        assert_eq!(
            err.to_string(),
            "signer is on Base (chain 8453), expected Ethereum (chain 1)"
        );
    }

    #[test]
    fn test_wrong_network_unknown_chain() {
        let err = Error::WrongNetwork {
            network: Network::Base,
            expected: 8453,
            actual: 137,
        };
        assert_eq!(err.to_string(), "signer is on chain 137, expected Base (chain 8453)");
    }
}

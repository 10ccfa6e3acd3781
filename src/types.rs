//! Common types shared across modules.

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// One token row of a recipient: the amount stays as typed until dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: String,
    pub amount: String,
}

impl TokenAmount {
    pub fn new(token: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            amount: amount.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub token_amounts: Vec<TokenAmount>,
}

impl Recipient {
    pub fn new(address: impl Into<String>, token_amounts: Vec<TokenAmount>) -> Self {
        Self {
            address: address.into(),
            token_amounts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.token_amounts.is_empty()
    }

    pub fn amount_for(&self, token: &str) -> Option<&str> {
        self.token_amounts
            .iter()
            .find(|ta| ta.token == token)
            .map(|ta| ta.amount.as_str())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.token_amounts.iter().map(|ta| ta.token.as_str())
    }

    /// Whether the entry may be committed to the confirmed list: a non-empty address,
    /// at least one row, non-empty symbols that do not repeat, and no blank amounts.
    pub fn is_committable(&self) -> bool {
        if self.address.is_empty() || self.token_amounts.is_empty() {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        self.token_amounts.iter().all(|ta| {
            !ta.token.is_empty() && !ta.amount.trim().is_empty() && seen.insert(ta.token.as_str())
        })
    }
}

/// Contract metadata for a token on one network. `address == None` is the native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Option<Address>,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn native(decimals: u8) -> Self {
        Self {
            address: None,
            decimals,
        }
    }

    pub fn erc20(address: Address, decimals: u8) -> Self {
        Self {
            address: Some(address),
            decimals,
        }
    }

    pub fn is_native(&self) -> bool {
        self.address.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_default_is_empty() {
        assert!(Recipient::default().is_empty());
        assert!(!Recipient::new("0xAAA", vec![]).is_empty());
    }

    #[test]
    fn test_amount_for() {
        let r = Recipient::new("0xAAA", vec![TokenAmount::new("USDC", "10")]);
        assert_eq!(r.amount_for("USDC"), Some("10"));
        assert_eq!(r.amount_for("ETH"), None);
    }

    #[test]
    fn test_is_committable() {
        let ok = Recipient::new("0xAAA", vec![TokenAmount::new("USDC", "1")]);
        assert!(ok.is_committable());

        assert!(!Recipient::new("", vec![TokenAmount::new("USDC", "1")]).is_committable());
        assert!(!Recipient::new("0xAAA", vec![]).is_committable());
        assert!(!Recipient::new("0xAAA", vec![TokenAmount::new("", "1")]).is_committable());
        assert!(!Recipient::new("0xAAA", vec![TokenAmount::new("USDC", "")]).is_committable());
        assert!(!Recipient::new("0xAAA", vec![TokenAmount::new("USDC", "  ")]).is_committable());

        let duplicated = Recipient::new(
            "0xAAA",
            vec![TokenAmount::new("USDC", "1"), TokenAmount::new("USDC", "2")],
        );
        assert!(!duplicated.is_committable());
    }

    #[test]
    fn test_token_info_native() {
        assert!(TokenInfo::native(18).is_native());
        assert!(!TokenInfo::erc20(Address::zero(), 6).is_native());
    }
}

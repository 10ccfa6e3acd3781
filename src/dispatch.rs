//! Sequential dispatch of a recipient list.
//!
//! Each (recipient, token) pair becomes one transaction: an ERC-20 `transfer` call for
//! tokens with a contract address, a plain value transfer for the native asset. Pairs are
//! resolved lazily, right before they are sent, and each submission is awaited before the
//! next one is built. The first failure stops the run; whatever was already submitted
//! stays on-chain and is reported back alongside the error.

use crate::config::Network;
use crate::error::{Error, Result};
use crate::registry::TokenRegistry;
use crate::signer::TransferSigner;
use crate::types::{Recipient, TokenAmount};
use crate::utils;
use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use tracing::{error, info};

pub const STATUS_SUCCESS: &str = "All transactions completed successfully.";
pub const STATUS_NOT_CONNECTED: &str = "Please connect your wallet first.";

/// ERC-20 `transfer(address to, uint256 amount) returns (bool)`
#[allow(deprecated)]
fn erc20_transfer_function() -> Function {
    Function {
        name: "transfer".to_string(),
        inputs: vec![
            Param {
                name: "to".to_string(),
                kind: ParamType::Address,
                internal_type: None,
            },
            Param {
                name: "amount".to_string(),
                kind: ParamType::Uint(256),
                internal_type: None,
            },
        ],
        outputs: vec![Param {
            name: "".to_string(),
            kind: ParamType::Bool,
            internal_type: None,
        }],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}

pub fn encode_erc20_transfer(to: Address, amount: U256) -> Result<Bytes> {
    erc20_transfer_function()
        .encode_input(&[Token::Address(to), Token::Uint(amount)])
        .map(Bytes::from)
        .map_err(|e| Error::signer(format!("failed to encode transfer call: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Native,
    Token { contract: Address },
}

/// A transfer whose symbol, address and amount have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransfer {
    /// Position of the recipient in the dispatched list
    pub recipient_index: usize,
    pub to: Address,
    pub token: String,
    /// Amount in base units
    pub amount: U256,
    pub decimals: u8,
    pub kind: TransferKind,
}

impl ResolvedTransfer {
    pub fn is_native(&self) -> bool {
        self.kind == TransferKind::Native
    }

    pub fn to_transaction(&self) -> Result<TypedTransaction> {
        let request = match self.kind {
            TransferKind::Native => Eip1559TransactionRequest::new().to(self.to).value(self.amount),
            TransferKind::Token { contract } => Eip1559TransactionRequest::new()
                .to(contract)
                .data(encode_erc20_transfer(self.to, self.amount)?),
        };
        Ok(TypedTransaction::Eip1559(request))
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} -> {:?}",
            utils::format_units(self.amount, self.decimals),
            self.token,
            self.to
        )
    }
}

/// Turn one draft-level token amount into a checked transfer.
///
/// Checks run in order: the symbol must exist on `network`, the recipient must be a valid
/// address, the amount must parse at the token's precision.
pub fn resolve_transfer(
    registry: &TokenRegistry,
    network: Network,
    recipient_index: usize,
    recipient: &Recipient,
    token_amount: &TokenAmount,
) -> Result<ResolvedTransfer> {
    let info = registry.resolve(network, &token_amount.token)?;

    let (kind, decimals) = match info.address {
        Some(contract) => (TransferKind::Token { contract }, info.decimals),
        None => (TransferKind::Native, network.native_decimals()),
    };
    let to: Address = recipient
        .address
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAddress(recipient.address.clone()))?;

    let amount = utils::parse_amount(&token_amount.amount, decimals)?;

    Ok(ResolvedTransfer {
        recipient_index,
        to,
        token: token_amount.token.clone(),
        amount,
        decimals,
        kind,
    })
}

/// Resolve every pair without submitting anything. Stops at the first invalid pair.
pub fn plan(
    registry: &TokenRegistry,
    recipients: &[Recipient],
    network: Network,
) -> Result<Vec<ResolvedTransfer>> {
    let mut transfers = Vec::new();
    for (index, recipient) in recipients.iter().enumerate() {
        for token_amount in &recipient.token_amounts {
            transfers.push(resolve_transfer(registry, network, index, recipient, token_amount)?);
        }
    }
    Ok(transfers)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransfer {
    pub transfer: ResolvedTransfer,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub network: Network,
    pub submitted: Vec<SubmittedTransfer>,
}

/// A run that stopped early. `submitted` lists what went out before `error`.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct DispatchFailure {
    pub network: Network,
    pub submitted: Vec<SubmittedTransfer>,
    #[source]
    pub error: Error,
}

pub type DispatchResult = std::result::Result<DispatchReport, DispatchFailure>;

/// Submit one transaction per (recipient, token) pair, strictly in list order.
///
/// `signer` is `None` when no wallet is connected. The recipient list is not checked
/// for emptiness; an empty list succeeds without submitting anything.
pub async fn dispatch(
    registry: &TokenRegistry,
    recipients: &[Recipient],
    network: Network,
    signer: Option<&dyn TransferSigner>,
) -> DispatchResult {
    let mut submitted = Vec::new();
    match run(registry, recipients, network, signer, &mut submitted).await {
        Ok(()) => {
            info!(
                "Dispatch on {} complete: {} transfer(s) submitted",
                network,
                submitted.len()
            );
            Ok(DispatchReport { network, submitted })
        }
        Err(error) => {
            error!(
                "Dispatch on {} stopped after {} submitted transfer(s): {}",
                network,
                submitted.len(),
                error
            );
            Err(DispatchFailure {
                network,
                submitted,
                error,
            })
        }
    }
}

async fn run(
    registry: &TokenRegistry,
    recipients: &[Recipient],
    network: Network,
    signer: Option<&dyn TransferSigner>,
    submitted: &mut Vec<SubmittedTransfer>,
) -> Result<()> {
    let signer = signer.ok_or(Error::NotConnected)?;

    let actual = signer.chain_id().await?;
    if actual != network.chain_id() {
        return Err(Error::WrongNetwork {
            network,
            expected: network.chain_id(),
            actual,
        });
    }

    let total: usize = recipients.iter().map(|r| r.token_amounts.len()).sum();
    info!(
        "Dispatching {} transfer(s) to {} recipient(s) on {} from {:?}",
        total,
        recipients.len(),
        network,
        signer.address()
    );

    for (index, recipient) in recipients.iter().enumerate() {
        for token_amount in &recipient.token_amounts {
            let transfer = resolve_transfer(registry, network, index, recipient, token_amount)?;
            info!(
                "Submitting transfer {}/{}: {}",
                submitted.len() + 1,
                total,
                transfer.describe()
            );
            let tx_hash = signer.submit(transfer.to_transaction()?).await?;
            submitted.push(SubmittedTransfer { transfer, tx_hash });
        }
    }

    Ok(())
}

/// The single human-readable status shown after a dispatch attempt.
pub fn status_message(result: &DispatchResult) -> String {
    match result {
        Ok(_) => STATUS_SUCCESS.to_string(),
        Err(failure) if matches!(failure.error, Error::NotConnected) => {
            STATUS_NOT_CONNECTED.to_string()
        }
        Err(failure) => format!("Error: {}", failure.error),
    }
}

//! Wallet/provider boundary used by the dispatch engine.
//!
//! `TransferSigner` is the only thing dispatch needs from a wallet: who is sending, which
//! chain it is on, and a way to get one transaction accepted. `EthersSigner` implements it
//! with a local private key and an HTTP provider.

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[async_trait]
pub trait TransferSigner: Send + Sync {
    /// Address transactions are sent from.
    fn address(&self) -> Address;

    async fn chain_id(&self) -> Result<u64>;

    /// Sign and submit one transaction, resolving once the provider has accepted it.
    async fn submit(&self, tx: TypedTransaction) -> Result<TxHash>;
}

/// Parse a hex private key (with or without `0x`) into a local wallet.
pub fn parse_wallet(private_key: &str) -> Result<LocalWallet> {
    private_key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| Error::Config(format!("invalid private key: {e}")))
}

pub struct EthersSigner {
    provider: Provider<Http>,
    wallet: LocalWallet,
    confirmations: usize,
    next_nonce: Mutex<Option<U256>>,
}

impl EthersSigner {
    /// Connect a private-key wallet to the configured RPC endpoint.
    pub async fn connect(config: &Config, private_key: &str) -> Result<Self> {
        let provider = config.get_provider()?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| Error::signer(format!("failed to query chain id: {e}")))?
            .as_u64();
        let wallet = parse_wallet(private_key)?.with_chain_id(chain_id);

        info!(
            "Connected signer {:?} on chain {} via {}",
            wallet.address(),
            chain_id,
            config.rpc_url
        );

        Ok(Self {
            provider,
            wallet,
            confirmations: config.confirmations,
            next_nonce: Mutex::new(None),
        })
    }

    /// Next nonce to use: the larger of the chain's pending count and our local counter.
    async fn reserve_nonce(&self) -> Result<U256> {
        let mut guard = self.next_nonce.lock().await;
        let on_chain = self
            .provider
            .get_transaction_count(self.wallet.address(), Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| Error::signer(format!("failed to fetch nonce: {e}")))?;
        let nonce = match *guard {
            Some(local) => std::cmp::max(local, on_chain),
            None => on_chain,
        };
        *guard = Some(nonce + 1);
        Ok(nonce)
    }

    async fn release_nonce(&self) {
        *self.next_nonce.lock().await = None;
    }
}

#[async_trait]
impl TransferSigner for EthersSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.wallet.chain_id())
    }

    async fn submit(&self, mut tx: TypedTransaction) -> Result<TxHash> {
        tx.set_from(self.wallet.address());
        tx.set_chain_id(self.wallet.chain_id());
        tx.set_nonce(self.reserve_nonce().await?);

        if let Err(e) = self.provider.fill_transaction(&mut tx, None).await {
            self.release_nonce().await;
            return Err(Error::signer(format!("failed to prepare transaction: {e}")));
        }

        let signature = match self.wallet.sign_transaction(&tx).await {
            Ok(signature) => signature,
            Err(e) => {
                self.release_nonce().await;
                return Err(Error::signer(format!("failed to sign transaction: {e}")));
            }
        };

        let pending = match self.provider.send_raw_transaction(tx.rlp_signed(&signature)).await {
            Ok(pending) => pending,
            Err(e) => {
                self.release_nonce().await;
                return Err(Error::signer(format!("failed to send transaction: {e}")));
            }
        };
        let tx_hash = pending.tx_hash();
        info!("Transaction sent: {:?}", tx_hash);

        if self.confirmations > 0 {
            let receipt = pending
                .confirmations(self.confirmations)
                .await
                .map_err(|e| Error::signer(format!("failed waiting for {tx_hash:?}: {e}")))?;
            if receipt.is_none() {
                // The nonce was never consumed on-chain.
                self.release_nonce().await;
            }
            check_receipt(tx_hash, receipt)?;
        }

        Ok(tx_hash)
    }
}

/// Outcome of waiting on a submitted transaction. A missing receipt means the node dropped it.
fn check_receipt(tx_hash: TxHash, receipt: Option<TransactionReceipt>) -> Result<()> {
    match receipt {
        Some(receipt) if receipt.status == Some(U64::zero()) => {
            Err(Error::signer(format!("transaction {tx_hash:?} reverted")))
        }
        Some(receipt) => {
            info!(
                "Transaction {:?} confirmed in block {:?}",
                tx_hash, receipt.block_number
            );
            Ok(())
        }
        None => {
            warn!("Transaction {:?} dropped from the mempool", tx_hash);
            Err(Error::signer(format!("transaction {tx_hash:?} was dropped before confirmation")))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Records every submitted transaction; optionally fails the n-th submission.
    pub(crate) struct RecordingSigner {
        pub chain_id: u64,
        pub fail_at: Option<usize>,
        submitted: StdMutex<Vec<TypedTransaction>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RecordingSigner {
        pub fn new(chain_id: u64) -> Self {
            Self {
                chain_id,
                fail_at: None,
                submitted: StdMutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn failing_at(chain_id: u64, index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Self::new(chain_id)
            }
        }

        pub fn submitted(&self) -> Vec<TypedTransaction> {
            self.submitted.lock().unwrap().clone()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferSigner for RecordingSigner {
        fn address(&self) -> Address {
            Address::from_low_u64_be(0xfeed)
        }

        async fn chain_id(&self) -> Result<u64> {
            Ok(self.chain_id)
        }

        async fn submit(&self, tx: TypedTransaction) -> Result<TxHash> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let mut submitted = self.submitted.lock().unwrap();
            let index = submitted.len();
            if self.fail_at == Some(index) {
                return Err(Error::signer("user rejected transaction"));
            }
            submitted.push(tx);
            Ok(TxHash::from_low_u64_be(index as u64 + 1))
        }
    }
}

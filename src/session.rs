//! One editing session: the recipient ledger, the selected network and the status line
//! left behind by the last import/export/dispatch.

use crate::config::Network;
use crate::csv_codec;
use crate::dispatch::{self, DispatchResult};
use crate::error::Result;
use crate::operation_log::OperationLog;
use crate::recipients::RecipientLedger;
use crate::registry::TokenRegistry;
use crate::signer::TransferSigner;
use std::sync::Arc;
use tracing::{info, warn};

pub struct MultiSendSession {
    ledger: RecipientLedger,
    registry: Arc<TokenRegistry>,
    status: Option<String>,
    log: Option<OperationLog>,
}

impl MultiSendSession {
    pub fn new(registry: Arc<TokenRegistry>, network: Network) -> Self {
        Self {
            ledger: RecipientLedger::new(Arc::clone(&registry), network),
            registry,
            status: None,
            log: None,
        }
    }

    /// Record every dispatch outcome in `log`.
    pub fn with_operation_log(mut self, log: OperationLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn ledger(&self) -> &RecipientLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut RecipientLedger {
        &mut self.ledger
    }

    pub fn network(&self) -> Network {
        self.ledger.network()
    }

    pub fn select_network(&mut self, network: Network) {
        self.ledger.set_network(network);
    }

    /// Latest status message, if any operation has run.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Replace the recipient list with the contents of a CSV document.
    pub fn import_csv(&mut self, text: &str) -> Result<usize> {
        let recipients = match csv_codec::decode(text) {
            Ok(recipients) => recipients,
            Err(e) => {
                self.status = Some(format!("Error: {e}"));
                return Err(e);
            }
        };
        let count = recipients.len();
        self.ledger.replace_all(recipients);
        self.status = Some(format!("Imported {count} recipient(s)."));
        Ok(count)
    }

    pub fn export_csv(&self) -> Result<String> {
        csv_codec::encode(self.ledger.recipients())
    }

    /// Whether the send action should be offered at all.
    pub fn can_send(&self, connected: bool) -> bool {
        connected && !self.ledger.recipients().is_empty()
    }

    /// Dispatch the confirmed list on the current network. The status line is updated
    /// from the outcome either way.
    pub async fn send(&mut self, signer: Option<&dyn TransferSigner>) -> DispatchResult {
        let network = self.network();
        info!(
            "Sending to {} recipient(s) on {}",
            self.ledger.recipients().len(),
            network
        );

        let result =
            dispatch::dispatch(&self.registry, self.ledger.recipients(), network, signer).await;

        if let Some(log) = &self.log {
            if let Err(e) = log.record_dispatch(&result) {
                warn!("Failed to write operation log {:?}: {}", log.path(), e);
            }
        }

        self.status = Some(dispatch::status_message(&result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::testing::RecordingSigner;

    const CSV: &str = "address,USDC,ETH\n\
        0x1111111111111111111111111111111111111111,100,\n\
        0x2222222222222222222222222222222222222222,,2.5\n";

    fn session() -> MultiSendSession {
        MultiSendSession::new(Arc::new(TokenRegistry::builtin()), Network::Ethereum)
    }

    #[test]
    fn test_import_then_export() {
        let mut session = session();
        assert_eq!(session.import_csv(CSV).unwrap(), 2);
        assert_eq!(session.status(), Some("Imported 2 recipient(s)."));
        assert_eq!(session.export_csv().unwrap(), CSV);
    }

    #[test]
    fn test_import_malformed_keeps_list() {
        let mut session = session();
        session.import_csv(CSV).unwrap();
        assert!(session.import_csv("").is_err());
        assert_eq!(session.ledger().recipients().len(), 2);
        assert!(session.status().unwrap().starts_with("Error: malformed input"));
    }

    #[test]
    fn test_can_send() {
        let mut session = session();
        assert!(!session.can_send(true));
        session.import_csv(CSV).unwrap();
        assert!(!session.can_send(false));
        assert!(session.can_send(true));
    }

    #[tokio::test]
    async fn test_send_success_updates_status_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = OperationLog::new(dir.path().join("log.txt"));
        let mut session = session().with_operation_log(log.clone());
        session.import_csv(CSV).unwrap();
        let signer = RecordingSigner::new(1);

        let result = session.send(Some(&signer)).await;

        assert!(result.is_ok());
        assert_eq!(signer.submitted().len(), 2);
        assert_eq!(session.status(), Some(dispatch::STATUS_SUCCESS));
        assert!(log.read().unwrap().contains("Completed: 2 transfer(s)"));
    }

    #[tokio::test]
    async fn test_send_without_wallet() {
        let mut session = session();
        session.import_csv(CSV).unwrap();

        assert!(session.send(None).await.is_err());
        assert_eq!(session.status(), Some(dispatch::STATUS_NOT_CONNECTED));
    }

    #[tokio::test]
    async fn test_send_after_network_switch_reports_unknown_token() {
        let mut session = session();
        session
            .import_csv("address,USDT\n0x1111111111111111111111111111111111111111,5\n")
            .unwrap();
        session.select_network(Network::Base);
        let signer = RecordingSigner::new(8453);

        assert!(session.send(Some(&signer)).await.is_err());
        assert_eq!(
            session.status(),
            Some("Error: token USDT is not available on Base")
        );
        assert!(signer.submitted().is_empty());
    }
}

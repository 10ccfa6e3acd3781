//! Recipient ledger: the confirmed recipient list plus the single draft being composed.
//!
//! Everything here is synchronous and owned by one caller. Field values are accepted as
//! typed; amounts and symbols are only checked for real when the list is dispatched.

use crate::config::Network;
use crate::error::{Error, Result};
use crate::registry::TokenRegistry;
use crate::types::{Recipient, TokenAmount};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RecipientLedger {
    registry: Arc<TokenRegistry>,
    network: Network,
    recipients: Vec<Recipient>,
    draft: Recipient,
    editing: Option<usize>,
}

impl RecipientLedger {
    pub fn new(registry: Arc<TokenRegistry>, network: Network) -> Self {
        Self {
            registry,
            network,
            recipients: Vec::new(),
            draft: Recipient::default(),
            editing: None,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn draft(&self) -> &Recipient {
        &self.draft
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Symbols the draft could still add on the current network.
    pub fn available_tokens(&self) -> Vec<String> {
        let used: Vec<&str> = self.draft.symbols().collect();
        self.registry.available_tokens(self.network, &used)
    }

    pub fn can_add_token_row(&self) -> bool {
        !self.available_tokens().is_empty()
    }

    /// Switch network. Draft rows whose symbol does not exist on the new network are
    /// dropped; confirmed recipients are left alone and fail at dispatch instead.
    pub fn set_network(&mut self, network: Network) {
        if network == self.network {
            return;
        }
        let registry = Arc::clone(&self.registry);
        let before = self.draft.token_amounts.len();
        self.draft
            .token_amounts
            .retain(|ta| registry.contains(network, &ta.token));
        let purged = before - self.draft.token_amounts.len();
        if purged > 0 {
            info!("Dropped {} draft token row(s) not available on {}", purged, network);
        }
        self.network = network;
    }

    // ---- draft rows ----

    /// Append a row for the first symbol not yet in the draft. Returns false when every
    /// registered symbol is already used.
    pub fn add_token_row(&mut self) -> bool {
        match self.available_tokens().into_iter().next() {
            Some(token) => {
                self.draft.token_amounts.push(TokenAmount::new(token, ""));
                true
            }
            None => false,
        }
    }

    pub fn remove_token_row(&mut self, index: usize) -> Result<TokenAmount> {
        self.check_row(index)?;
        Ok(self.draft.token_amounts.remove(index))
    }

    /// Replace the symbol of a draft row. Duplicates are caught at commit time.
    pub fn set_token_row_symbol(&mut self, index: usize, symbol: impl Into<String>) -> Result<()> {
        self.check_row(index)?;
        self.draft.token_amounts[index].token = symbol.into();
        Ok(())
    }

    pub fn set_token_row_amount(&mut self, index: usize, amount: impl Into<String>) -> Result<()> {
        self.check_row(index)?;
        self.draft.token_amounts[index].amount = amount.into();
        Ok(())
    }

    pub fn set_draft_address(&mut self, address: impl Into<String>) {
        self.draft.address = address.into();
    }

    fn check_row(&self, index: usize) -> Result<()> {
        let len = self.draft.token_amounts.len();
        if index < len {
            Ok(())
        } else {
            Err(Error::index_out_of_range(index, len))
        }
    }

    fn check_recipient(&self, index: usize) -> Result<()> {
        let len = self.recipients.len();
        if index < len {
            Ok(())
        } else {
            Err(Error::index_out_of_range(index, len))
        }
    }

    // ---- commits ----

    /// Append the draft to the confirmed list and clear it. No-op returning false when the
    /// draft is not committable.
    pub fn commit_add(&mut self) -> bool {
        if !self.draft.is_committable() {
            debug!("Draft not committable, ignoring add");
            return false;
        }
        let recipient = std::mem::take(&mut self.draft);
        debug!("Added recipient {}", recipient.address);
        self.recipients.push(recipient);
        true
    }

    /// Load a confirmed entry into the draft for editing.
    pub fn begin_edit(&mut self, index: usize) -> Result<()> {
        self.check_recipient(index)?;
        self.draft = self.recipients[index].clone();
        self.editing = Some(index);
        Ok(())
    }

    /// Replace the entry being edited with the draft. No-op returning false when not
    /// editing or the draft is not committable.
    pub fn commit_edit(&mut self) -> bool {
        let Some(index) = self.editing else {
            return false;
        };
        if !self.draft.is_committable() || index >= self.recipients.len() {
            debug!("Draft not committable for index {}, ignoring update", index);
            return false;
        }
        self.recipients[index] = std::mem::take(&mut self.draft);
        self.editing = None;
        true
    }

    /// Abandon the current edit, clearing the draft.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.draft = Recipient::default();
    }

    pub fn remove_recipient(&mut self, index: usize) -> Result<Recipient> {
        self.check_recipient(index)?;
        let removed = self.recipients.remove(index);
        match self.editing {
            Some(editing) if editing == index => self.cancel_edit(),
            Some(editing) if editing > index => self.editing = Some(editing - 1),
            _ => {}
        }
        Ok(removed)
    }

    /// Swap in a whole new recipient list (CSV import). Draft and edit mode are untouched.
    pub fn replace_all(&mut self, recipients: Vec<Recipient>) {
        info!("Replacing {} recipient(s) with {}", self.recipients.len(), recipients.len());
        self.recipients = recipients;
    }
}

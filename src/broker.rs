// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction Broker
//!
//! Turns one transfer request into at most one ledger transaction.
//!
//! ## Lifecycle
//!
//! ```text
//! Validated -> Signed -> Submitted -> Confirmed | Failed | TimedOut
//! ```
//!
//! - Validation (amount, recipient, sender, funds) happens before any key is
//!   decrypted.
//! - Sender chain state (nonce, fees) is fetched fresh for every call.
//! - Submission runs on its own task: once the signed payload is handed to
//!   the network, an abandoned caller cannot cancel the confirmation wait or
//!   its logging. Submission tasks are tracked so shutdown can wait for
//!   them with [`TransactionBroker::drain`].
//! - A signed payload is broadcast once. `TimedOut` means "unknown outcome",
//!   and callers must check [`TransactionBroker::transfer_status`] rather than
//!   resubmit.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use tokio_util::task::TaskTracker;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::blockchain::{
    format_amount, parse_amount, sign_native_transfer, Ledger, LedgerError, NetworkConfig,
    TxStatus, NATIVE_DECIMALS,
};
use crate::custody::{keys::format_address, redact, CustodyError, KeyCustodyManager};

/// Default bound on the confirmation wait.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Transfer lifecycle states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Validated,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    TimedOut,
}

impl TransferState {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferState::Validated => "validated",
            TransferState::Signed => "signed",
            TransferState::Submitted => "submitted",
            TransferState::Confirmed => "confirmed",
            TransferState::Failed => "failed",
            TransferState::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer and balance errors.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("sender has no wallet")]
    SenderNotFound,

    #[error("recipient has no wallet")]
    RecipientNotFound,

    #[error("insufficient funds: balance {available} AVAX, transfer needs up to {required} AVAX")]
    InsufficientFunds { available: String, required: String },

    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// The ledger could not be reached before anything was submitted.
    #[error("ledger unavailable: {0}")]
    Network(String),

    /// The transaction was refused or reverted. A new transfer may be tried.
    #[error("transaction failed: {cause}")]
    TransactionFailed { tx_hash: Option<B256>, cause: String },

    /// The transaction was submitted but not confirmed in time.
    #[error("transaction {tx_hash} not confirmed in time; outcome unknown")]
    TimedOut { tx_hash: B256 },
}

/// A native balance.
#[derive(Debug, Clone)]
pub struct Balance {
    pub public_address: String,
    pub wei: U256,
}

impl Balance {
    pub fn formatted(&self) -> String {
        format_amount(self.wei, NATIVE_DECIMALS)
    }
}

/// Result of a confirmed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// Correlation id used in logs.
    pub transfer_id: Uuid,
    /// Confirmation signature (transaction hash).
    pub tx_hash: B256,
    pub from: String,
    pub to: String,
    /// Amount in wei.
    pub amount_wei: U256,
    pub block_number: Option<u64>,
    pub explorer_url: String,
}

/// Builds, signs, submits and confirms native transfers.
pub struct TransactionBroker {
    custody: Arc<KeyCustodyManager>,
    ledger: Arc<dyn Ledger>,
    confirmation_timeout: Duration,
    submissions: TaskTracker,
}

impl TransactionBroker {
    pub fn new(
        custody: Arc<KeyCustodyManager>,
        ledger: Arc<dyn Ledger>,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            custody,
            ledger,
            confirmation_timeout,
            submissions: TaskTracker::new(),
        }
    }

    /// Submissions still waiting on the ledger.
    pub fn in_flight(&self) -> usize {
        self.submissions.len()
    }

    /// Wait up to `grace` for in-flight submissions to settle.
    ///
    /// Returns `false` if some were still running when `grace` elapsed.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.submissions.close();
        let in_flight = self.submissions.len();
        if in_flight > 0 {
            info!(in_flight, "Waiting for in-flight submissions");
        }
        tokio::time::timeout(grace, self.submissions.wait()).await.is_ok()
    }

    pub fn network(&self) -> &NetworkConfig {
        self.ledger.network()
    }

    /// Native balance of a raw address.
    pub async fn get_balance(&self, public_address: &str) -> Result<U256, TransferError> {
        let address = parse_address(public_address)?;
        self.ledger.balance(address).await.map_err(network_error)
    }

    /// Native balance of the wallet custodied for `identifier`.
    pub async fn balance_of(&self, identifier: &str) -> Result<Balance, TransferError> {
        let public_address = self.custody.public_address(identifier)?;
        let wei = self.get_balance(&public_address).await?;
        Ok(Balance {
            public_address,
            wei,
        })
    }

    /// Move `amount` AVAX from `sender`'s wallet to `recipient`'s wallet.
    ///
    /// Returns once the transaction is confirmed, or fails. See the module
    /// docs for the retry contract.
    pub async fn transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let transfer_id = Uuid::new_v4();
        let span = info_span!(
            "transfer",
            %transfer_id,
            sender = %redact(sender),
            recipient = %redact(recipient),
        );
        self.transfer_inner(transfer_id, sender, recipient, amount)
            .instrument(span)
            .await
    }

    async fn transfer_inner(
        &self,
        transfer_id: Uuid,
        sender: &str,
        recipient: &str,
        amount: &str,
    ) -> Result<TransferReceipt, TransferError> {
        // 1. Amount
        let value = parse_amount(amount, NATIVE_DECIMALS)
            .map_err(|e| TransferError::InvalidAmount(e.to_string()))?;
        if value.is_zero() {
            return Err(TransferError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }

        // 2. Parties, before any key material is touched
        let to = self
            .custody
            .find_address(recipient)?
            .ok_or(TransferError::RecipientNotFound)?;
        let to = parse_address(&to)?;
        let from = self
            .custody
            .find_address(sender)?
            .ok_or(TransferError::SenderNotFound)?;
        let from = parse_address(&from)?;

        info!(state = %TransferState::Validated, amount_wei = %value, "Transfer validated");

        // 3. Fresh sender state
        let state = self.ledger.sender_state(from).await.map_err(network_error)?;
        let required = value.saturating_add(state.max_transfer_fee());
        if state.balance < required {
            return Err(TransferError::InsufficientFunds {
                available: format_amount(state.balance, NATIVE_DECIMALS),
                required: format_amount(required, NATIVE_DECIMALS),
            });
        }

        // 4. Sign with the transiently decrypted key
        let signed = self
            .custody
            .sign_transfer(sender, |signer| {
                sign_native_transfer(signer, &state, to, value)
            })
            .map_err(|e| match e {
                CustodyError::IdentityNotFound(_) => TransferError::SenderNotFound,
                other => TransferError::Custody(other),
            })?;
        let tx_hash = signed.tx_hash;
        info!(state = %TransferState::Signed, %tx_hash, nonce = signed.nonce, "Transfer signed");

        // 5. Submit once and wait, detached from the caller
        let ledger = Arc::clone(&self.ledger);
        let timeout = self.confirmation_timeout;
        let submission = self.submissions.spawn(
            async move {
                info!(state = %TransferState::Submitted, %tx_hash, "Submitting transfer");
                let result = ledger.submit_and_confirm(&signed, timeout).await;
                log_outcome(tx_hash, &result);
                result
            }
            .in_current_span(),
        );

        let result = submission.await.unwrap_or_else(|e| {
            error!(%tx_hash, error = %e, "Submission task aborted; outcome unknown");
            Err(LedgerError::TimedOut(tx_hash))
        });

        // 6. Outcome
        match result {
            Ok(confirmation) => Ok(TransferReceipt {
                transfer_id,
                tx_hash: confirmation.tx_hash,
                from: format_address(from),
                to: format_address(to),
                amount_wei: value,
                block_number: confirmation.block_number,
                explorer_url: self.network().explorer_tx_url(&confirmation.tx_hash),
            }),
            Err(LedgerError::TimedOut(tx_hash)) => Err(TransferError::TimedOut { tx_hash }),
            Err(LedgerError::Reverted(tx_hash)) => Err(TransferError::TransactionFailed {
                tx_hash: Some(tx_hash),
                cause: "transaction reverted".to_string(),
            }),
            Err(e) => Err(TransferError::TransactionFailed {
                tx_hash: Some(tx_hash),
                cause: e.to_string(),
            }),
        }
    }

    /// On-chain status of a submitted transfer, for "check later" polling.
    pub async fn transfer_status(&self, tx_hash: &str) -> Result<TxStatus, TransferError> {
        let hash = B256::from_str(tx_hash.trim())
            .map_err(|e| TransferError::InvalidTxHash(e.to_string()))?;
        self.ledger
            .transaction_status(hash)
            .await
            .map_err(network_error)
    }

    /// Latest block, proving the ledger is reachable.
    pub async fn ledger_height(&self) -> Result<u64, TransferError> {
        self.ledger.latest_block().await.map_err(network_error)
    }
}

fn parse_address(raw: &str) -> Result<Address, TransferError> {
    Address::from_str(raw.trim()).map_err(|e| TransferError::InvalidAddress(e.to_string()))
}

fn network_error(e: LedgerError) -> TransferError {
    match e {
        LedgerError::InvalidAddress(msg) => TransferError::InvalidAddress(msg),
        other => TransferError::Network(other.to_string()),
    }
}

fn log_outcome(
    tx_hash: B256,
    result: &Result<crate::blockchain::Confirmation, LedgerError>,
) {
    match result {
        Ok(confirmation) => info!(
            state = %TransferState::Confirmed,
            %tx_hash,
            block_number = ?confirmation.block_number,
            "Transfer confirmed"
        ),
        Err(LedgerError::TimedOut(_)) => warn!(
            state = %TransferState::TimedOut,
            %tx_hash,
            "Transfer not confirmed in time; outcome unknown"
        ),
        Err(e) => warn!(
            state = %TransferState::Failed,
            %tx_hash,
            error = %e,
            "Transfer failed"
        ),
    }
}

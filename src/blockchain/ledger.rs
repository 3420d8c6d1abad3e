// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The ledger network as seen by the transfer broker.

use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use super::types::{Confirmation, NetworkConfig, SenderState, SignedTransfer, TxStatus};

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The node could not be reached or answered with an error. Retryable.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node refused the signed transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The transaction was included but reverted.
    #[error("Transaction {0} reverted")]
    Reverted(B256),

    /// The transaction was accepted but its outcome is not known yet.
    #[error("Transaction {0} not confirmed in time")]
    TimedOut(B256),
}

/// Ledger network operations used by custody and transfers.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Network this ledger talks to.
    fn network(&self) -> &NetworkConfig;

    /// Native balance of `address`, in wei.
    async fn balance(&self, address: Address) -> Result<U256, LedgerError>;

    /// Current nonce, fee caps and balance for a prospective sender.
    async fn sender_state(&self, address: Address) -> Result<SenderState, LedgerError>;

    /// Broadcast `transfer` and wait up to `timeout` for one confirmation.
    ///
    /// Never rebroadcasts. A timeout yields [`LedgerError::TimedOut`]; the
    /// transaction may still land afterwards.
    async fn submit_and_confirm(
        &self,
        transfer: &SignedTransfer,
        timeout: Duration,
    ) -> Result<Confirmation, LedgerError>;

    /// Receipt-based status of a submitted transaction.
    async fn transaction_status(&self, tx_hash: B256) -> Result<TxStatus, LedgerError>;

    /// Latest block number; used for readiness checks.
    async fn latest_block(&self) -> Result<u64, LedgerError>;
}

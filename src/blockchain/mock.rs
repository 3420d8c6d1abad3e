// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process ledger for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use super::ledger::{Ledger, LedgerError};
use super::types::{Confirmation, NetworkConfig, SenderState, SignedTransfer, TxStatus, AVAX_FUJI};

/// How the mock answers a submission.
#[derive(Debug, Clone)]
pub enum SubmitBehavior {
    Confirm,
    Reject(String),
    Revert,
    /// Accept the transaction but never confirm it.
    NeverConfirm,
}

/// Ledger double that records every call.
pub struct MockLedger {
    network: NetworkConfig,
    balances: Mutex<HashMap<Address, U256>>,
    nonces: Mutex<HashMap<Address, u64>>,
    behavior: Mutex<SubmitBehavior>,
    rpc_down: Mutex<bool>,
    submitted: Mutex<Vec<SignedTransfer>>,
    statuses: Mutex<HashMap<B256, TxStatus>>,
    calls: AtomicUsize,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            network: AVAX_FUJI,
            balances: Mutex::new(HashMap::new()),
            nonces: Mutex::new(HashMap::new()),
            behavior: Mutex::new(SubmitBehavior::Confirm),
            rpc_down: Mutex::new(false),
            submitted: Mutex::new(Vec::new()),
            statuses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockLedger {
    pub fn set_balance(&self, address: Address, wei: U256) {
        self.balances.lock().unwrap().insert(address, wei);
    }

    pub fn set_behavior(&self, behavior: SubmitBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_rpc_down(&self, down: bool) {
        *self.rpc_down.lock().unwrap() = down;
    }

    pub fn set_status(&self, tx_hash: B256, status: TxStatus) {
        self.statuses.lock().unwrap().insert(tx_hash, status);
    }

    /// Every transfer handed to `submit_and_confirm`.
    pub fn submitted(&self) -> Vec<SignedTransfer> {
        self.submitted.lock().unwrap().clone()
    }

    /// Number of ledger calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.rpc_down.lock().unwrap() {
            return Err(LedgerError::Rpc("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn balance(&self, address: Address) -> Result<U256, LedgerError> {
        self.enter()?;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn sender_state(&self, address: Address) -> Result<SenderState, LedgerError> {
        self.enter()?;
        let balance = self
            .balances
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or(U256::ZERO);
        let nonce = self.nonces.lock().unwrap().get(&address).copied().unwrap_or(0);
        Ok(SenderState {
            chain_id: self.network.chain_id,
            nonce,
            max_fee_per_gas: 51_500_000_000,
            max_priority_fee_per_gas: 1_500_000_000,
            balance,
        })
    }

    async fn submit_and_confirm(
        &self,
        transfer: &SignedTransfer,
        timeout: Duration,
    ) -> Result<Confirmation, LedgerError> {
        self.enter()?;
        let behavior = self.behavior.lock().unwrap().clone();
        if let SubmitBehavior::Reject(reason) = &behavior {
            return Err(LedgerError::Rejected(reason.clone()));
        }

        self.submitted.lock().unwrap().push(transfer.clone());
        *self.nonces.lock().unwrap().entry(transfer.from).or_insert(0) += 1;

        match behavior {
            SubmitBehavior::Confirm => {
                self.set_status(transfer.tx_hash, TxStatus::Confirmed { block_number: Some(1) });
                Ok(Confirmation {
                    tx_hash: transfer.tx_hash,
                    block_number: Some(1),
                })
            }
            SubmitBehavior::Revert => {
                self.set_status(transfer.tx_hash, TxStatus::Failed { block_number: Some(1) });
                Err(LedgerError::Reverted(transfer.tx_hash))
            }
            SubmitBehavior::NeverConfirm | SubmitBehavior::Reject(_) => {
                let _ = tokio::time::timeout(timeout, std::future::pending::<()>()).await;
                Err(LedgerError::TimedOut(transfer.tx_hash))
            }
        }
    }

    async fn transaction_status(&self, tx_hash: B256) -> Result<TxStatus, LedgerError> {
        self.enter()?;
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(&tx_hash)
            .copied()
            .unwrap_or(TxStatus::Pending))
    }

    async fn latest_block(&self) -> Result<u64, LedgerError> {
        self.enter()?;
        Ok(1)
    }
}

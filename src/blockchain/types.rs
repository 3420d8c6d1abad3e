// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::borrow::Cow;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Serialize;
use utoipa::ToSchema;

/// Decimals of the native asset. `1 AVAX = 10^18 wei`.
pub const NATIVE_DECIMALS: u8 = 18;

/// Native asset symbol.
pub const NATIVE_SYMBOL: &str = "AVAX";

/// Gas consumed by a plain value transfer between externally owned accounts.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Avalanche network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Short key used in configuration (`fuji`, `mainnet`)
    pub key: &'static str,
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: Cow<'static, str>,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Avalanche C-Chain Mainnet configuration.
pub const AVAX_MAINNET: NetworkConfig = NetworkConfig {
    key: "mainnet",
    name: "Avalanche C-Chain",
    chain_id: 43114,
    rpc_url: Cow::Borrowed("https://api.avax.network/ext/bc/C/rpc"),
    explorer_url: "https://snowtrace.io",
};

/// Avalanche Fuji Testnet configuration.
pub const AVAX_FUJI: NetworkConfig = NetworkConfig {
    key: "fuji",
    name: "Avalanche Fuji Testnet",
    chain_id: 43113,
    rpc_url: Cow::Borrowed("https://api.avax-test.network/ext/bc/C/rpc"),
    explorer_url: "https://testnet.snowtrace.io",
};

impl NetworkConfig {
    /// Resolve a network by its configuration key (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "fuji" => Some(AVAX_FUJI),
            "mainnet" => Some(AVAX_MAINNET),
            _ => None,
        }
    }

    /// Replace the default RPC endpoint.
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Cow::Owned(rpc_url.into());
        self
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &B256) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

/// Sender-side chain state needed to build a transaction.
///
/// Fetched fresh for every transfer attempt so a retried transfer is built
/// against the current nonce rather than replaying an earlier payload.
#[derive(Debug, Clone)]
pub struct SenderState {
    pub chain_id: u64,
    /// Next nonce, including pending transactions.
    pub nonce: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    /// Spendable balance in wei.
    pub balance: U256,
}

impl SenderState {
    /// Worst-case fee of a native transfer at these gas prices.
    pub fn max_transfer_fee(&self) -> U256 {
        U256::from(NATIVE_TRANSFER_GAS) * U256::from(self.max_fee_per_gas)
    }
}

/// A signed native transfer ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub tx_hash: B256,
    pub from: Address,
    pub to: Address,
    /// Amount in wei.
    pub value: U256,
    pub nonce: u64,
    /// EIP-2718 encoded transaction.
    pub raw: Bytes,
}

/// A transaction that reached the required confirmation level.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// On-chain status of a previously submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TxStatus {
    /// No receipt yet (still in the mempool, dropped, or unknown to the node).
    Pending,
    /// Included and executed successfully.
    Confirmed { block_number: Option<u64> },
    /// Included but reverted.
    Failed { block_number: Option<u64> },
}

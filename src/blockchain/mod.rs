// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration module for Avalanche C-Chain.
//!
//! This module provides functionality for:
//! - Querying native AVAX balances
//! - Building and signing native transfers
//! - Broadcasting and awaiting confirmation
//! - Receipt-based status lookup

pub mod client;
pub mod ledger;
#[cfg(test)]
pub mod mock;
pub mod transactions;
pub mod types;

pub use client::AvaxClient;
pub use ledger::{Ledger, LedgerError};
pub use transactions::{format_amount, parse_amount, sign_native_transfer, AmountError};
pub use types::*;

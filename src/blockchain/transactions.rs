// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building and amount conversion for Avalanche C-Chain.
//!
//! Transfers are EIP-1559 native value transfers, signed locally and
//! broadcast as raw EIP-2718 bytes.

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
    network::TxSignerSync,
    primitives::{Address, TxKind, U256},
    signers::local::PrivateKeySigner,
};

use super::types::{SenderState, SignedTransfer, NATIVE_TRANSFER_GAS};

/// Amount parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must be a plain decimal number")]
    Malformed,

    #[error("too many decimal places (max {0})")]
    TooPrecise(u8),

    #[error("amount is too large")]
    Overflow,
}

/// Build and sign a native transfer of `value` wei to `to`.
pub fn sign_native_transfer(
    signer: &PrivateKeySigner,
    state: &SenderState,
    to: Address,
    value: U256,
) -> Result<SignedTransfer, alloy::signers::Error> {
    let mut tx = TxEip1559 {
        chain_id: state.chain_id,
        nonce: state.nonce,
        gas_limit: NATIVE_TRANSFER_GAS,
        max_fee_per_gas: state.max_fee_per_gas,
        max_priority_fee_per_gas: state.max_priority_fee_per_gas,
        to: TxKind::Call(to),
        value,
        ..Default::default()
    };

    let signature = signer.sign_transaction_sync(&mut tx)?;
    let signed = tx.into_signed(signature);
    let tx_hash = *signed.hash();
    let raw = TxEnvelope::from(signed).encoded_2718();

    Ok(SignedTransfer {
        tx_hash,
        from: signer.address(),
        to,
        value,
        nonce: state.nonce,
        raw: raw.into(),
    })
}

/// Parse a human-readable amount to its smallest unit.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for AVAX)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Malformed);
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Malformed);
    }
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooPrecise(decimals));
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| AmountError::Overflow)?
    };
    let fraction = if fraction.is_empty() {
        U256::ZERO
    } else {
        // Pad with zeros to match decimals
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| AmountError::Overflow)?
    };

    let multiplier = U256::from(10u64).pow(U256::from(decimals));
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Format wei (or token units) to human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reply texts and TwiML rendering.

use alloy::primitives::{B256, U256};

use crate::blockchain::{format_amount, NATIVE_DECIMALS, NATIVE_SYMBOL};

/// Decimal places shown for balances in chat.
const CHAT_BALANCE_DECIMALS: usize = 4;

pub const UNKNOWN: &str = "🤖 Sorry, I didn't understand. Type *help*.";
pub const NO_WALLET: &str = "❌ No wallet found. Type *create wallet* to begin.";
pub const PARTY_NOT_FOUND: &str = "❌ Sender or receiver not found.";
pub const SOMETHING_WENT_WRONG: &str = "⚠️ Something went wrong. Try again later.";
pub const INVITES_DISABLED: &str = "❌ Invites are not available right now.";
pub const TRANSFER_FAILED: &str = "❌ Transaction failed. Try again later.";

pub fn help() -> String {
    format!(
        "🪙 *{NATIVE_SYMBOL} WhatsApp Wallet Bot*\n\
         Commands:\n\
         - create wallet\n\
         - balance\n\
         - address\n\
         - send 0.1 +91XXXXXXXXXX\n\
         - invite +91XXXXXXXXXX"
    )
}

pub fn wallet_created(address: &str) -> String {
    format!("🚀 Wallet created:\n{address}")
}

pub fn wallet_exists(address: &str) -> String {
    format!("✅ Wallet already exists:\n{address}")
}

pub fn address(address: &str) -> String {
    format!("📬 Your wallet address is:\n{address}")
}

pub fn balance(wei: U256) -> String {
    format!(
        "💰 Your balance is {} {NATIVE_SYMBOL}",
        fixed_decimals(wei, CHAT_BALANCE_DECIMALS)
    )
}

pub fn usage(usage: &str) -> String {
    format!("❌ Use format: {usage}")
}

pub fn invalid_amount(usage: &str) -> String {
    format!("❌ Invalid amount. Use format: {usage}")
}

pub fn insufficient_funds(available: &str) -> String {
    format!("❌ Insufficient balance. You have {available} {NATIVE_SYMBOL} (plus network fee needed).")
}

pub fn sent(amount: &str, recipient: &str, tx_hash: &B256) -> String {
    format!("✅ Sent {amount} {NATIVE_SYMBOL} to {recipient}\n🔖 Tx: {tx_hash}")
}

pub fn pending(tx_hash: &B256) -> String {
    format!("⏳ Transfer submitted but not confirmed yet. Do not resend.\n🔖 Tx: {tx_hash}")
}

pub fn invite_sent(target: &str) -> String {
    format!("✅ Invite sent to {target}")
}

pub fn invite_failed(target: &str) -> String {
    format!("❌ Could not send invite to {target}")
}

/// Message delivered to an invited number.
pub fn invitation() -> String {
    format!(
        "👋 Hey! You've been invited to create your own *{NATIVE_SYMBOL} Wallet* on WhatsApp.\n\n\
         Just message:\n\n    create wallet\n\n\
         to this number and start sending & receiving {NATIVE_SYMBOL} 🚀"
    )
}

/// Render an amount with exactly `places` decimals, truncating the rest.
fn fixed_decimals(wei: U256, places: usize) -> String {
    let full = format_amount(wei, NATIVE_DECIMALS);
    let (whole, fraction) = full.split_once('.').unwrap_or((full.as_str(), ""));
    let mut fraction: String = fraction.chars().take(places).collect();
    while fraction.len() < places {
        fraction.push('0');
    }
    format!("{whole}.{fraction}")
}

/// Wrap a reply in a TwiML `<Response>` with a single `<Message>`.
pub fn twiml_message(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(body)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

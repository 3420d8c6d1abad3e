// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key custody for phone-number identities.
//!
//! This module provides:
//! - Keypair generation and encrypted persistence (`get_or_create`)
//! - Address lookup
//! - Transient key decryption scoped to a single signing closure

pub mod keys;
pub mod manager;

pub use manager::{CustodiedWallet, CustodyError, CustodyResult, KeyCustodyManager};

/// Longest identifier accepted (E.164 is at most 15 digits plus `+`).
pub const MAX_IDENTIFIER_LEN: usize = 32;

/// Channel prefix Twilio puts in front of WhatsApp numbers.
const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Normalize a caller-supplied identifier.
///
/// Trims whitespace and the WhatsApp channel prefix. Returns `None` for an
/// empty or oversized identifier.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(WHATSAPP_PREFIX).unwrap_or(trimmed).trim();
    if trimmed.is_empty() || trimmed.len() > MAX_IDENTIFIER_LEN {
        return None;
    }
    Some(trimmed.to_string())
}

/// Redact an identifier for logs, keeping the last four characters.
pub fn redact(identifier: &str) -> String {
    let visible: String = identifier
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{visible}")
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat command parser.
//!
//! Commands are matched on the lower-cased, trimmed message in this order:
//!
//! | Text | Intent |
//! |------|--------|
//! | contains `create wallet` | `CreateWallet` |
//! | contains `balance` | `GetBalance` |
//! | contains `address` | `GetAddress` |
//! | starts with `send` | `Transfer` (`send <amount> <recipient>`) |
//! | starts with `invite` | `Invite` (`invite <number>`) |
//! | contains `help` | `Help` |

pub const SEND_USAGE: &str = "send 0.1 +91XXXXXXXXXX";
pub const INVITE_USAGE: &str = "invite +91XXXXXXXXXX";

/// What a chat message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateWallet,
    GetBalance,
    GetAddress,
    Transfer { amount: String, recipient: String },
    Invite { target: String },
    Help,
    /// A known command with missing arguments.
    Malformed { usage: &'static str },
    Unknown,
}

pub fn parse_command(text: &str) -> Intent {
    let msg = text.trim().to_lowercase();

    if msg.contains("create wallet") {
        Intent::CreateWallet
    } else if msg.contains("balance") {
        Intent::GetBalance
    } else if msg.contains("address") {
        Intent::GetAddress
    } else if msg.starts_with("send") {
        let mut parts = msg.split_whitespace().skip(1);
        match (parts.next(), parts.next()) {
            (Some(amount), Some(recipient)) => Intent::Transfer {
                amount: amount.to_string(),
                recipient: recipient.to_string(),
            },
            _ => Intent::Malformed { usage: SEND_USAGE },
        }
    } else if msg.starts_with("invite") {
        match msg.split_whitespace().nth(1) {
            Some(target) => Intent::Invite {
                target: target.to_string(),
            },
            None => Intent::Malformed {
                usage: INVITE_USAGE,
            },
        }
    } else if msg.contains("help") {
        Intent::Help
    } else {
        Intent::Unknown
    }
}

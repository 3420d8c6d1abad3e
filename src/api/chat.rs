// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Twilio WhatsApp webhook.
//!
//! Twilio posts each inbound message as a form and expects a TwiML document
//! back. Every outcome, including internal failures, is answered with a chat
//! reply and HTTP 200 so Twilio does not retry the webhook.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    blockchain::{format_amount, NATIVE_DECIMALS},
    broker::TransferError,
    chat::{
        parse_command,
        parser::{INVITE_USAGE, SEND_USAGE},
        replies, twiml_message, Intent,
    },
    custody::{normalize_identifier, redact, CustodyError},
    state::AppState,
};

/// Inbound message fields used from Twilio's webhook form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TwilioMessage {
    /// Sender, e.g. `whatsapp:+919876543210`.
    #[serde(rename = "From")]
    pub from: String,
    /// Message text.
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Handle an inbound WhatsApp message.
#[utoipa::path(
    post,
    path = "/v1/chat/twilio",
    tag = "Chat",
    request_body(content = TwilioMessage, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "TwiML reply", content_type = "text/xml", body = String)
    )
)]
pub async fn twilio_webhook(
    State(state): State<AppState>,
    Form(message): Form<TwilioMessage>,
) -> Response {
    let reply = respond(&state, &message.from, &message.body).await;
    (
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        twiml_message(&reply),
    )
        .into_response()
}

/// Execute one chat command and produce the reply text.
pub(crate) async fn respond(state: &AppState, from: &str, body: &str) -> String {
    let Some(phone) = normalize_identifier(from) else {
        warn!("Chat message without a usable sender");
        return replies::SOMETHING_WENT_WRONG.to_string();
    };

    let intent = parse_command(body);
    info!(sender = %redact(&phone), intent = %intent_name(&intent), "Chat command received");

    match intent {
        Intent::CreateWallet => match state.custody.get_or_create(&phone) {
            Ok(wallet) if wallet.created => replies::wallet_created(&wallet.public_address),
            Ok(wallet) => replies::wallet_exists(&wallet.public_address),
            Err(e) => internal(e),
        },
        Intent::GetBalance => match state.broker.balance_of(&phone).await {
            Ok(balance) => replies::balance(balance.wei),
            Err(TransferError::Custody(CustodyError::IdentityNotFound(_))) => {
                replies::NO_WALLET.to_string()
            }
            Err(e) => internal(e),
        },
        Intent::GetAddress => match state.custody.find_address(&phone) {
            Ok(Some(address)) => replies::address(&address),
            Ok(None) => replies::NO_WALLET.to_string(),
            Err(e) => internal(e),
        },
        Intent::Transfer { amount, recipient } => {
            let Some(recipient) = normalize_identifier(&recipient) else {
                return replies::usage(SEND_USAGE);
            };
            transfer(state, &phone, &recipient, &amount).await
        }
        Intent::Invite { target } => invite(state, &target).await,
        Intent::Help => replies::help(),
        Intent::Malformed { usage } => replies::usage(usage),
        Intent::Unknown => replies::UNKNOWN.to_string(),
    }
}

async fn transfer(state: &AppState, sender: &str, recipient: &str, amount: &str) -> String {
    match state.broker.transfer(sender, recipient, amount).await {
        Ok(receipt) => replies::sent(
            &format_amount(receipt.amount_wei, NATIVE_DECIMALS),
            recipient,
            &receipt.tx_hash,
        ),
        Err(TransferError::SenderNotFound | TransferError::RecipientNotFound) => {
            replies::PARTY_NOT_FOUND.to_string()
        }
        Err(TransferError::InvalidAmount(_)) => replies::invalid_amount(SEND_USAGE),
        Err(TransferError::InsufficientFunds { available, .. }) => {
            replies::insufficient_funds(&available)
        }
        Err(TransferError::TimedOut { tx_hash }) => replies::pending(&tx_hash),
        Err(TransferError::TransactionFailed { .. } | TransferError::Network(_)) => {
            replies::TRANSFER_FAILED.to_string()
        }
        Err(e) => internal(e),
    }
}

async fn invite(state: &AppState, target: &str) -> String {
    let Some(messenger) = state.messenger.as_ref() else {
        return replies::INVITES_DISABLED.to_string();
    };
    let Some(target) = normalize_identifier(target) else {
        return replies::usage(INVITE_USAGE);
    };

    match messenger.send_message(&target, &replies::invitation()).await {
        Ok(_) => replies::invite_sent(&target),
        Err(e) => {
            warn!(target = %redact(&target), error = %e, "Failed to send invite");
            replies::invite_failed(&target)
        }
    }
}

fn internal(e: impl std::fmt::Display) -> String {
    error!(error = %e, "Chat command failed");
    replies::SOMETHING_WENT_WRONG.to_string()
}

fn intent_name(intent: &Intent) -> &'static str {
    match intent {
        Intent::CreateWallet => "create_wallet",
        Intent::GetBalance => "balance",
        Intent::GetAddress => "address",
        Intent::Transfer { .. } => "send",
        Intent::Invite { .. } => "invite",
        Intent::Help => "help",
        Intent::Malformed { .. } => "malformed",
        Intent::Unknown => "unknown",
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Phone Wallet Relay - Custodial Avalanche Wallets for Phone Numbers
//!
//! This crate issues and holds secp256k1 keys on behalf of users identified
//! by a phone number, and relays native AVAX transfers they request over
//! HTTP or WhatsApp.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and the Twilio webhook (Axum)
//! - `blockchain` - Avalanche C-Chain integration
//! - `broker` - Transfer lifecycle: validate, sign, submit, confirm
//! - `chat` - WhatsApp command parsing and replies
//! - `crypto` - At-rest encryption of key material
//! - `custody` - Key generation, storage and transient use
//! - `messaging` - Outbound WhatsApp messages (Twilio)
//! - `storage` - Identity records (redb)

pub mod api;
pub mod blockchain;
pub mod broker;
pub mod chat;
pub mod config;
pub mod crypto;
pub mod custody;
pub mod error;
pub mod messaging;
pub mod state;
pub mod storage;

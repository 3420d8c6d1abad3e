// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! WhatsApp chat front end: command parsing and reply rendering.
//!
//! Everything here is pure. The webhook handler in `api::chat` wires the
//! parsed [`Intent`] to custody and the broker.

pub mod parser;
pub mod replies;

pub use parser::{parse_command, Intent};
pub use replies::twiml_message;

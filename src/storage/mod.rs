// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Storage
//!
//! Durable mapping from a user identifier (phone number) to the wallet
//! custodied for it.
//!
//! ## Security Model
//!
//! - Only the *encrypted* private key is ever written to disk
//! - The encryption key lives in process memory only (see `crypto`)
//! - Records are never returned to API callers; only the public address is
//!
//! ## Uniqueness
//!
//! One record per identifier. The existence check and the insert run in a
//! single storage transaction, so two concurrent creations for the same
//! identifier cannot both succeed. The loser receives [`StoreError::Conflict`].

pub mod identity;
pub mod identity_db;

pub use identity::{EncryptedSecret, IdentityRecord, IdentityStore, StoreError, StoreResult};
pub use identity_db::IdentityDatabase;

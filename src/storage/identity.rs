// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity record types and the storage contract.

use chrono::{DateTime, Utc};

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record for this identifier already exists.
    #[error("identity already exists: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Cipher token holding a private key. Opaque outside the crate.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedSecret(Vec<u8>);

impl EncryptedSecret {
    pub fn new(token: Vec<u8>) -> Self {
        Self(token)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedSecret({} bytes)", self.0.len())
    }
}

/// A custodied wallet bound to one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Stable external user key (phone number). Immutable.
    pub identifier: String,
    /// Checksummed address derived from the private key at generation time.
    pub public_address: String,
    /// Private key encrypted under the master key.
    pub encrypted_secret: EncryptedSecret,
    /// When the wallet was created.
    pub created_at: DateTime<Utc>,
}

/// Durable keyed storage for identity records.
///
/// Implementations must make [`create`](IdentityStore::create) atomic with
/// respect to other creations for the same identifier.
pub trait IdentityStore: Send + Sync {
    /// Look up the record for `identifier`.
    fn find(&self, identifier: &str) -> StoreResult<Option<IdentityRecord>>;

    /// Insert `record` if no record exists for its identifier.
    ///
    /// Returns [`StoreError::Conflict`] when one already does; the stored
    /// record is left untouched.
    fn create(&self, record: IdentityRecord) -> StoreResult<IdentityRecord>;
}

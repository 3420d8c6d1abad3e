// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded identity database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `identities`: identifier → JSON `{public_address, encrypted_secret, created_at}`
//!
//! `encrypted_secret` is stored as standard base64 of the cipher token.
//!
//! redb admits one write transaction at a time, so the existence check and
//! the insert in [`IdentityDatabase::create`] cannot interleave with another
//! creation.

use std::path::Path;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::identity::{
    EncryptedSecret, IdentityRecord, IdentityStore, StoreError, StoreResult,
};

/// Primary table: identifier → serialized [`StoredIdentity`] (JSON bytes).
const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

/// On-disk shape of a record. The identifier is the table key.
#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    public_address: String,
    encrypted_secret: String,
    created_at: DateTime<Utc>,
}

impl StoredIdentity {
    fn from_record(record: &IdentityRecord) -> Self {
        Self {
            public_address: record.public_address.clone(),
            encrypted_secret: Base64::encode_string(record.encrypted_secret.as_bytes()),
            created_at: record.created_at,
        }
    }

    fn into_record(self, identifier: &str) -> StoreResult<IdentityRecord> {
        let token = Base64::decode_vec(&self.encrypted_secret)
            .map_err(|e| StoreError::Serialization(format!("encrypted_secret: {e}")))?;
        Ok(IdentityRecord {
            identifier: identifier.to_string(),
            public_address: self.public_address,
            encrypted_secret: EncryptedSecret::new(token),
            created_at: self.created_at,
        })
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

macro_rules! database_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Database(e.to_string())
                }
            }
        )+
    };
}

database_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

// =============================================================================
// IdentityDatabase
// =============================================================================

/// redb-backed [`IdentityStore`].
pub struct IdentityDatabase {
    db: Database,
}

impl IdentityDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so read transactions never see it missing.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(IDENTITIES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Number of stored identities.
    pub fn count(&self) -> StoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}

impl IdentityStore for IdentityDatabase {
    fn find(&self, identifier: &str) -> StoreResult<Option<IdentityRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        match table.get(identifier)? {
            Some(value) => {
                let stored: StoredIdentity = serde_json::from_slice(value.value())?;
                stored.into_record(identifier).map(Some)
            }
            None => Ok(None),
        }
    }

    fn create(&self, record: IdentityRecord) -> StoreResult<IdentityRecord> {
        let json = serde_json::to_vec(&StoredIdentity::from_record(&record))?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(IDENTITIES)?;
            if table.get(record.identifier.as_str())?.is_some() {
                return Err(StoreError::Conflict(record.identifier));
            }
            table.insert(record.identifier.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(record)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key Custody Manager.
//!
//! # Responsibilities
//!
//! - Generate, encrypt and persist one keypair per identifier
//! - Resolve identifiers to public addresses
//! - Decrypt a sender's key for exactly one signing closure
//!
//! The decrypted secret never leaves [`KeyCustodyManager::sign_transfer`]:
//! the plaintext buffer is zeroized as soon as the signer is built, and the
//! signer (whose key zeroizes on drop) is dropped when the closure returns.

use std::str::FromStr;
use std::sync::Arc;

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use chrono::Utc;
use tracing::{debug, error, info};

use super::keys::{format_address, generate_signer, signer_from_secret};
use super::redact;
use crate::crypto::{self, MasterKey};
use crate::storage::{EncryptedSecret, IdentityRecord, IdentityStore, StoreError};

/// Custody errors.
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error("invalid identifier")]
    InvalidIdentifier,

    #[error("no wallet for identifier {0}")]
    IdentityNotFound(String),

    /// Stored ciphertext did not decrypt under the current master key.
    /// Indicates a master key mismatch or tampering, never a user error.
    #[error("stored key could not be decrypted")]
    Decryption,

    /// Decrypted key does not match the stored address.
    #[error("stored key does not match stored address")]
    KeyMismatch,

    #[error("key encryption failed")]
    Encryption,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CustodyResult<T> = Result<T, CustodyError>;

/// Outcome of [`KeyCustodyManager::get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodiedWallet {
    /// Checksummed public address.
    pub public_address: String,
    /// Whether this call generated the wallet.
    pub created: bool,
}

/// Orchestrates key generation, encrypted storage and transient decryption.
pub struct KeyCustodyManager {
    store: Arc<dyn IdentityStore>,
    master_key: MasterKey,
}

impl KeyCustodyManager {
    pub fn new(store: Arc<dyn IdentityStore>, master_key: MasterKey) -> Self {
        Self { store, master_key }
    }

    /// Return the wallet for `identifier`, generating one on first use.
    ///
    /// Safe under concurrent first use: when another caller wins the insert,
    /// the freshly generated key is discarded and the winner's record is
    /// returned.
    pub fn get_or_create(&self, identifier: &str) -> CustodyResult<CustodiedWallet> {
        ensure_identifier(identifier)?;

        if let Some(record) = self.store.find(identifier)? {
            return Ok(CustodiedWallet {
                public_address: record.public_address,
                created: false,
            });
        }

        let signer = generate_signer();
        let public_address = format_address(signer.address());

        let mut secret = signer.to_bytes();
        let token = crypto::encrypt(secret.as_slice(), &self.master_key);
        zeroize::Zeroize::zeroize(&mut secret.0);
        drop(signer);
        let token = token.map_err(|_| CustodyError::Encryption)?;

        let record = IdentityRecord {
            identifier: identifier.to_string(),
            public_address,
            encrypted_secret: EncryptedSecret::new(token),
            created_at: Utc::now(),
        };

        match self.store.create(record) {
            Ok(record) => {
                info!(
                    identifier = %redact(identifier),
                    public_address = %record.public_address,
                    "Created custodial wallet"
                );
                Ok(CustodiedWallet {
                    public_address: record.public_address,
                    created: true,
                })
            }
            Err(StoreError::Conflict(_)) => {
                debug!(
                    identifier = %redact(identifier),
                    "Lost wallet creation race, returning existing wallet"
                );
                let existing = self
                    .store
                    .find(identifier)?
                    .ok_or_else(|| CustodyError::IdentityNotFound(redact(identifier)))?;
                Ok(CustodiedWallet {
                    public_address: existing.public_address,
                    created: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up the public address for `identifier`, if it has a wallet.
    pub fn find_address(&self, identifier: &str) -> CustodyResult<Option<String>> {
        ensure_identifier(identifier)?;
        Ok(self.store.find(identifier)?.map(|r| r.public_address))
    }

    /// Look up the public address for `identifier`.
    pub fn public_address(&self, identifier: &str) -> CustodyResult<String> {
        self.find_address(identifier)?
            .ok_or_else(|| CustodyError::IdentityNotFound(redact(identifier)))
    }

    /// Decrypt the sender's key and hand a signer to `build`.
    ///
    /// The key is zeroized when this returns, whether `build` succeeded or
    /// not. A decryption failure is logged as an operational alarm.
    pub fn sign_transfer<T, F>(&self, sender: &str, build: F) -> CustodyResult<T>
    where
        F: FnOnce(&PrivateKeySigner) -> Result<T, alloy::signers::Error>,
    {
        ensure_identifier(sender)?;
        let record = self
            .store
            .find(sender)?
            .ok_or_else(|| CustodyError::IdentityNotFound(redact(sender)))?;

        let signer = {
            let secret = crypto::decrypt(record.encrypted_secret.as_bytes(), &self.master_key)
                .map_err(|e| {
                    error!(
                        identifier = %redact(sender),
                        error = %e,
                        alarm = "custody_decryption_failure",
                        "Stored key failed to decrypt; master key mismatch or tampering"
                    );
                    CustodyError::Decryption
                })?;
            signer_from_secret(&secret).map_err(|e| {
                error!(
                    identifier = %redact(sender),
                    error = %e,
                    alarm = "custody_key_corrupt",
                    "Decrypted key is not a valid secp256k1 scalar"
                );
                CustodyError::Decryption
            })?
        };

        let expected = Address::from_str(&record.public_address).map_err(|_| {
            error!(
                identifier = %redact(sender),
                alarm = "custody_key_mismatch",
                "Stored address is malformed"
            );
            CustodyError::KeyMismatch
        })?;
        if signer.address() != expected {
            error!(
                identifier = %redact(sender),
                alarm = "custody_key_mismatch",
                "Decrypted key does not derive the stored address"
            );
            return Err(CustodyError::KeyMismatch);
        }

        build(&signer).map_err(|e| CustodyError::Signing(e.to_string()))
    }
}

fn ensure_identifier(identifier: &str) -> CustodyResult<()> {
    if identifier.is_empty() || identifier.len() > super::MAX_IDENTIFIER_LEN {
        return Err(CustodyError::InvalidIdentifier);
    }
    Ok(())
}

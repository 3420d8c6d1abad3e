// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! secp256k1 key handling for custodied wallets.
//!
//! Keys are stored as the raw 32-byte scalar, encrypted. Addresses follow
//! the Ethereum derivation (last 20 bytes of keccak256 of the uncompressed
//! public key) and are rendered EIP-55 checksummed.

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use k256::{ecdsa::SigningKey, elliptic_curve::rand_core::OsRng};

/// Generate a fresh secp256k1 signer from the OS CSPRNG.
pub fn generate_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_signing_key(SigningKey::random(&mut OsRng))
}

/// Rebuild a signer from a decrypted 32-byte secret.
pub fn signer_from_secret(secret: &[u8]) -> Result<PrivateKeySigner, String> {
    PrivateKeySigner::from_slice(secret).map_err(|e| e.to_string())
}

/// Render an address the way it is stored and returned to callers.
pub fn format_address(address: Address) -> String {
    address.to_checksum(None)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric encryption of private keys under the process master key.
//!
//! ## Token Format (v1)
//!
//! ```text
//! version (1 byte, 0x01) || nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! - Cipher: AES-256-GCM
//! - Nonce: fresh random 96 bits per call (OS RNG)
//! - AAD: the version byte, binding the token to its format
//!
//! A token is self-describing: decrypting needs only the token and the key.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use zeroize::Zeroizing;

/// Master key length (256-bit).
pub const MASTER_KEY_LEN: usize = 32;

/// Current token format version.
const TOKEN_VERSION: u8 = 0x01;

/// AES-GCM nonce length (96-bit).
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
const TAG_LEN: usize = 16;

/// Header length: version byte + nonce.
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Cipher errors.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("master key must be {MASTER_KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("master key is not valid hex: {0}")]
    InvalidKeyEncoding(String),

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed: {0}")]
    Decryption(&'static str),
}

/// Process-wide secret used to encrypt every stored private key.
///
/// Constructed once at startup and shared read-only. The bytes are zeroized
/// when the last owner drops it, and `Debug` never prints them.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    /// Build a key from raw bytes, rejecting anything but exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        let array: [u8; MASTER_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(Zeroizing::new(array)))
    }

    /// Parse a hex-encoded key (64 chars, optional `0x` prefix).
    pub fn from_hex(encoded: &str) -> Result<Self, CipherError> {
        let bytes = Zeroizing::new(
            alloy::hex::decode(encoded.trim())
                .map_err(|e| CipherError::InvalidKeyEncoding(e.to_string()))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Generate a random key. Used by tests and for provisioning.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        Self(Zeroizing::new(key.into()))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(&Key::<Aes256Gcm>::from(*self.0))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Encrypt `plaintext` into a self-describing token.
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<Vec<u8>, CipherError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let aad = [TOKEN_VERSION];

    let ciphertext = key
        .cipher()
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| CipherError::Encryption)?;

    let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    token.push(TOKEN_VERSION);
    token.extend_from_slice(&nonce);
    token.extend_from_slice(&ciphertext);
    Ok(token)
}

/// Decrypt a token produced by [`encrypt`].
///
/// Fails with [`CipherError::Decryption`] if the token is truncated, carries
/// an unknown version, or does not authenticate under `key`.
pub fn decrypt(token: &[u8], key: &MasterKey) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if token.len() < HEADER_LEN + TAG_LEN {
        return Err(CipherError::Decryption("token too short"));
    }
    if token[0] != TOKEN_VERSION {
        return Err(CipherError::Decryption("unsupported token version"));
    }

    let nonce: [u8; NONCE_LEN] = token[1..HEADER_LEN]
        .try_into()
        .map_err(|_| CipherError::Decryption("token too short"))?;
    let nonce = Nonce::from(nonce);
    let aad = [TOKEN_VERSION];

    key.cipher()
        .decrypt(
            &nonce,
            Payload {
                msg: &token[HEADER_LEN..],
                aad: &aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| CipherError::Decryption("authentication failed"))
}

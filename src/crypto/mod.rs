// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! At-rest protection of custodial key material.

pub mod cipher;

pub use cipher::{decrypt, encrypt, CipherError, MasterKey, MASTER_KEY_LEN};

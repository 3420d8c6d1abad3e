// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Any invalid
//! value stops the process before it binds a socket.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MASTER_KEY` | 32-byte key encrypting custodied keys, as 64 hex chars | Required |
//! | `DATA_DIR` | Directory holding the identity database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `NETWORK` | `fuji` or `mainnet` | `fuji` |
//! | `RPC_URL` | Override the network's default RPC endpoint | Network default |
//! | `CONFIRMATION_TIMEOUT_SECS` | Confirmation wait bound (1-300) | `30` |
//! | `TWILIO_ACCOUNT_SID` | Twilio account (invites) | Optional |
//! | `TWILIO_AUTH_TOKEN` | Twilio auth token (invites) | Optional |
//! | `TWILIO_WHATSAPP_NUMBER` | WhatsApp sender number (invites) | Optional |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS | Optional |
//! | `TLS_KEY_PATH` | PEM private key; enables HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! The three Twilio variables and the two TLS variables are all-or-none.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::NetworkConfig;
use crate::broker::DEFAULT_CONFIRMATION_TIMEOUT;
use crate::crypto::{CipherError, MasterKey};
use crate::messaging::TwilioConfig;

pub const MASTER_KEY_ENV: &str = "MASTER_KEY";

/// Environment variable name for the data directory path.
///
/// The identity database lives at `$DATA_DIR/identities.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const NETWORK_ENV: &str = "NETWORK";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CONFIRMATION_TIMEOUT_ENV: &str = "CONFIRMATION_TIMEOUT_SECS";
pub const TWILIO_ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
pub const TWILIO_AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
pub const TWILIO_WHATSAPP_NUMBER_ENV: &str = "TWILIO_WHATSAPP_NUMBER";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_NETWORK: &str = "fuji";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// File name of the identity database inside `DATA_DIR`.
pub const IDENTITY_DB_FILE: &str = "identities.redb";

const MAX_CONFIRMATION_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("MASTER_KEY is invalid: {0}")]
    InvalidMasterKey(#[source] CipherError),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0} must be set together")]
    Incomplete(&'static str),
}

/// Paths for HTTPS serving.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Complete service configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub master_key: MasterKey,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub network: NetworkConfig,
    pub confirmation_timeout: Duration,
    pub twilio: Option<TwilioConfig>,
    pub tls: Option<TlsPaths>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let master_key = get(MASTER_KEY_ENV).ok_or(ConfigError::Missing(MASTER_KEY_ENV))?;
        let master_key = MasterKey::from_hex(&master_key).map_err(ConfigError::InvalidMasterKey)?;

        let data_dir = PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let network_key = get(NETWORK_ENV).unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let mut network =
            NetworkConfig::from_key(&network_key).ok_or_else(|| ConfigError::Invalid {
                name: NETWORK_ENV,
                reason: format!("unknown network '{network_key}' (expected fuji or mainnet)"),
            })?;
        if let Some(rpc_url) = get(RPC_URL_ENV) {
            network = network.with_rpc_url(rpc_url);
        }

        let confirmation_timeout = match get(CONFIRMATION_TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        name: CONFIRMATION_TIMEOUT_ENV,
                        reason: e.to_string(),
                    }
                })?;
                if !(1..=MAX_CONFIRMATION_TIMEOUT_SECS).contains(&secs) {
                    return Err(ConfigError::Invalid {
                        name: CONFIRMATION_TIMEOUT_ENV,
                        reason: format!("must be between 1 and {MAX_CONFIRMATION_TIMEOUT_SECS}"),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_CONFIRMATION_TIMEOUT,
        };

        let twilio = match (
            get(TWILIO_ACCOUNT_SID_ENV),
            get(TWILIO_AUTH_TOKEN_ENV),
            get(TWILIO_WHATSAPP_NUMBER_ENV),
        ) {
            (Some(account_sid), Some(auth_token), Some(whatsapp_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                whatsapp_number,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_WHATSAPP_NUMBER",
                ))
            }
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete("TLS_CERT_PATH and TLS_KEY_PATH")),
        };

        Ok(Self {
            master_key,
            data_dir,
            host,
            port,
            network,
            confirmation_timeout,
            twilio,
            tls,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            })
    }

    pub fn identity_db_path(&self) -> PathBuf {
        self.data_dir.join(IDENTITY_DB_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_master_key() {
        let config = load(&[(MASTER_KEY_ENV, KEY_HEX)]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.network.chain_id, 43113);
        assert_eq!(config.confirmation_timeout, Duration::from_secs(30));
        assert!(config.twilio.is_none());
        assert!(config.tls.is_none());
        assert_eq!(
            config.identity_db_path(),
            PathBuf::from("./data/identities.redb")
        );
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn master_key_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing(MASTER_KEY_ENV))));
        assert!(matches!(
            load(&[(MASTER_KEY_ENV, "   ")]),
            Err(ConfigError::Missing(MASTER_KEY_ENV))
        ));
    }

    #[test]
    fn short_or_garbled_master_key_is_rejected() {
        assert!(matches!(
            load(&[(MASTER_KEY_ENV, "abcd")]),
            Err(ConfigError::InvalidMasterKey(_))
        ));
        let not_hex = "zz".repeat(32);
        assert!(matches!(
            load(&[(MASTER_KEY_ENV, not_hex.as_str())]),
            Err(ConfigError::InvalidMasterKey(_))
        ));
    }

    #[test]
    fn network_and_rpc_override() {
        let config = load(&[
            (MASTER_KEY_ENV, KEY_HEX),
            (NETWORK_ENV, "mainnet"),
            (RPC_URL_ENV, "http://localhost:9650/ext/bc/C/rpc"),
        ])
        .unwrap();
        assert_eq!(config.network.chain_id, 43114);
        assert_eq!(config.network.rpc_url, "http://localhost:9650/ext/bc/C/rpc");

        assert!(matches!(
            load(&[(MASTER_KEY_ENV, KEY_HEX), (NETWORK_ENV, "ropsten")]),
            Err(ConfigError::Invalid { name: NETWORK_ENV, .. })
        ));
    }

    #[test]
    fn confirmation_timeout_is_bounded() {
        let config = load(&[(MASTER_KEY_ENV, KEY_HEX), (CONFIRMATION_TIMEOUT_ENV, "5")]).unwrap();
        assert_eq!(config.confirmation_timeout, Duration::from_secs(5));

        for bad in ["0", "301", "soon"] {
            assert!(
                load(&[(MASTER_KEY_ENV, KEY_HEX), (CONFIRMATION_TIMEOUT_ENV, bad)]).is_err(),
                "{bad}"
            );
        }
    }

    #[test]
    fn twilio_is_all_or_none() {
        let config = load(&[
            (MASTER_KEY_ENV, KEY_HEX),
            (TWILIO_ACCOUNT_SID_ENV, "AC1"),
            (TWILIO_AUTH_TOKEN_ENV, "token"),
            (TWILIO_WHATSAPP_NUMBER_ENV, "+14155238886"),
        ])
        .unwrap();
        assert_eq!(config.twilio.unwrap().account_sid, "AC1");

        assert!(matches!(
            load(&[(MASTER_KEY_ENV, KEY_HEX), (TWILIO_ACCOUNT_SID_ENV, "AC1")]),
            Err(ConfigError::Incomplete(_))
        ));
    }

    #[test]
    fn tls_paths_are_all_or_none() {
        let config = load(&[
            (MASTER_KEY_ENV, KEY_HEX),
            (TLS_CERT_PATH_ENV, "/certs/server.pem"),
            (TLS_KEY_PATH_ENV, "/certs/server.key"),
        ])
        .unwrap();
        assert!(config.tls.is_some());

        assert!(matches!(
            load(&[(MASTER_KEY_ENV, KEY_HEX), (TLS_KEY_PATH_ENV, "/k")]),
            Err(ConfigError::Incomplete(_))
        ));
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(matches!(
            load(&[(MASTER_KEY_ENV, KEY_HEX), (PORT_ENV, "http")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = load(&[
            (MASTER_KEY_ENV, KEY_HEX),
            (TWILIO_ACCOUNT_SID_ENV, "AC1"),
            (TWILIO_AUTH_TOKEN_ENV, "super-secret"),
            (TWILIO_WHATSAPP_NUMBER_ENV, "+14155238886"),
        ])
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(KEY_HEX));
        assert!(!rendered.contains("super-secret"));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Avalanche C-Chain client for blockchain interactions.

use std::future::IntoFuture;
use std::time::Duration;

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, U256},
    providers::{Provider, RootProvider},
};
use async_trait::async_trait;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::ledger::{Ledger, LedgerError};
use super::types::{Confirmation, NetworkConfig, SenderState, SignedTransfer, TxStatus};

/// Base fee assumed when the latest block does not report one (25 gwei).
const DEFAULT_BASE_FEE: u128 = 25_000_000_000;

/// Standard priority fee for Avalanche (1.5 gwei).
const PRIORITY_FEE: u128 = 1_500_000_000;

/// Bound on a single read-only RPC call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Avalanche C-Chain client.
pub struct AvaxClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: RootProvider,
    rpc_timeout: Duration,
}

impl AvaxClient {
    /// Create a new client for the specified network.
    pub fn new(network: NetworkConfig) -> Result<Self, LedgerError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let provider = RootProvider::new_http(url);

        Ok(Self {
            network,
            provider,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        })
    }

    /// Override the bound on read-only RPC calls.
    pub fn with_rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Run one read-only RPC call under `rpc_timeout`.
    async fn bounded<F, T, E>(&self, what: &str, call: F) -> Result<T, LedgerError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match timeout(self.rpc_timeout, call).await {
            Ok(result) => result.map_err(|e| LedgerError::Rpc(format!("{what}: {e}"))),
            Err(_) => Err(LedgerError::Rpc(format!(
                "{what}: no response within {:?}",
                self.rpc_timeout
            ))),
        }
    }

    /// Get current gas prices from the network as `(max_fee, priority_fee)`.
    async fn gas_prices(&self) -> Result<(u128, u128), LedgerError> {
        let block = self
            .bounded(
                "Failed to get block",
                self.provider.get_block_by_number(BlockNumberOrTag::Latest),
            )
            .await?
            .ok_or_else(|| LedgerError::Rpc("No latest block".to_string()))?;

        let base_fee = block
            .header
            .base_fee_per_gas
            .map(u128::from)
            .unwrap_or(DEFAULT_BASE_FEE);

        // Max fee = 2 * base_fee + priority_fee (allows for base fee increase)
        let max_fee = base_fee.saturating_mul(2).saturating_add(PRIORITY_FEE);

        Ok((max_fee, PRIORITY_FEE))
    }
}

#[async_trait]
impl Ledger for AvaxClient {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn balance(&self, address: Address) -> Result<U256, LedgerError> {
        self.bounded("Failed to get balance", self.provider.get_balance(address))
            .await
    }

    async fn sender_state(&self, address: Address) -> Result<SenderState, LedgerError> {
        let nonce = self
            .bounded(
                "Failed to get nonce",
                self.provider.get_transaction_count(address).pending(),
            )
            .await?;
        let balance = self.balance(address).await?;
        let (max_fee_per_gas, max_priority_fee_per_gas) = self.gas_prices().await?;

        Ok(SenderState {
            chain_id: self.network.chain_id,
            nonce,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            balance,
        })
    }

    async fn submit_and_confirm(
        &self,
        transfer: &SignedTransfer,
        confirmation_timeout: Duration,
    ) -> Result<Confirmation, LedgerError> {
        let tx_hash = transfer.tx_hash;
        // One deadline covers the broadcast and the receipt wait. Once the
        // payload is on the wire the node may hold it, so running out of time
        // at either step is an unknown outcome, not a failure.
        let deadline = Instant::now() + confirmation_timeout;

        let broadcast = self.provider.send_raw_transaction(&transfer.raw);
        let pending = match timeout_at(deadline, broadcast).await {
            Err(_) => {
                warn!(tx_hash = %tx_hash, "Node did not answer the broadcast in time");
                return Err(LedgerError::TimedOut(tx_hash));
            }
            Ok(Err(e)) => return Err(LedgerError::Rejected(e.to_string())),
            Ok(Ok(pending)) => pending,
        };
        debug!(tx_hash = %tx_hash, "Transaction accepted by node, awaiting receipt");

        let receipt = match timeout_at(deadline, pending.get_receipt()).await {
            Err(_) => return Err(LedgerError::TimedOut(tx_hash)),
            Ok(Err(e)) => {
                // The node has the transaction; its fate is unknown, not failed.
                warn!(tx_hash = %tx_hash, error = %e, "Lost track of submitted transaction");
                return Err(LedgerError::TimedOut(tx_hash));
            }
            Ok(Ok(receipt)) => receipt,
        };

        if receipt.status() {
            Ok(Confirmation {
                tx_hash,
                block_number: receipt.block_number,
            })
        } else {
            Err(LedgerError::Reverted(tx_hash))
        }
    }

    async fn transaction_status(&self, tx_hash: B256) -> Result<TxStatus, LedgerError> {
        let receipt = self
            .bounded(
                "Failed to get receipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?;

        Ok(match receipt {
            None => TxStatus::Pending,
            Some(r) if r.status() => TxStatus::Confirmed {
                block_number: r.block_number,
            },
            Some(r) => TxStatus::Failed {
                block_number: r.block_number,
            },
        })
    }

    async fn latest_block(&self) -> Result<u64, LedgerError> {
        self.bounded("Failed to get block number", self.provider.get_block_number())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::blockchain::sign_native_transfer;
    use crate::blockchain::types::AVAX_FUJI;
    use crate::custody::keys::generate_signer;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    /// Accepts connections and never answers.
    async fn silent_node() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    /// JSON-RPC node answering each method with `answer(method)`.
    async fn rpc_node<A>(answer: A) -> String
    where
        A: Fn(&str) -> Result<Value, Value> + Send + Sync + 'static,
    {
        let answer = Arc::new(answer);
        let app = Router::new().route(
            "/",
            post(move |Json(request): Json<Value>| {
                let answer = answer.clone();
                async move {
                    let method = request["method"].as_str().unwrap_or_default();
                    let mut response = json!({ "jsonrpc": "2.0", "id": request["id"].clone() });
                    match answer(method) {
                        Ok(result) => response["result"] = result,
                        Err(error) => response["error"] = error,
                    }
                    Json(response)
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn client(rpc_url: String) -> AvaxClient {
        AvaxClient::new(AVAX_FUJI.with_rpc_url(rpc_url)).unwrap()
    }

    fn signed_transfer() -> SignedTransfer {
        let state = SenderState {
            chain_id: AVAX_FUJI.chain_id,
            nonce: 0,
            max_fee_per_gas: 51_500_000_000,
            max_priority_fee_per_gas: PRIORITY_FEE,
            balance: U256::ZERO,
        };
        sign_native_transfer(
            &generate_signer(),
            &state,
            Address::repeat_byte(0x22),
            U256::from(1u64),
        )
        .unwrap()
    }

    #[test]
    fn rejects_malformed_rpc_url() {
        let result = AvaxClient::new(AVAX_FUJI.with_rpc_url("not a url"));
        assert!(matches!(result, Err(LedgerError::InvalidRpcUrl(_))));
    }

    #[test]
    fn builds_for_default_networks() {
        let client = AvaxClient::new(AVAX_FUJI).unwrap();
        assert_eq!(client.network().chain_id, 43113);
    }

    #[tokio::test]
    async fn silent_node_times_out_broadcast_within_bound() {
        let client = client(silent_node().await);
        let transfer = signed_transfer();

        let started = std::time::Instant::now();
        let result = timeout(
            Duration::from_secs(5),
            client.submit_and_confirm(&transfer, Duration::from_millis(300)),
        )
        .await
        .expect("submission must respect its own bound");

        assert!(matches!(result, Err(LedgerError::TimedOut(h)) if h == transfer.tx_hash));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn silent_node_bounds_read_calls() {
        let client = client(silent_node().await).with_rpc_timeout(Duration::from_millis(200));

        let result = timeout(
            Duration::from_secs(5),
            client.sender_state(Address::repeat_byte(0x11)),
        )
        .await
        .expect("sender state must respect the RPC bound");
        assert!(matches!(result, Err(LedgerError::Rpc(_))));

        let result = timeout(Duration::from_secs(5), client.latest_block())
            .await
            .expect("block number must respect the RPC bound");
        assert!(matches!(result, Err(LedgerError::Rpc(_))));
    }

    #[tokio::test]
    async fn broadcast_error_is_rejected() {
        let url = rpc_node(|method| match method {
            "eth_sendRawTransaction" => Err(json!({ "code": -32000, "message": "nonce too low" })),
            _ => Err(json!({ "code": -32601, "message": "method not found" })),
        })
        .await;
        let client = client(url);

        let result = client
            .submit_and_confirm(&signed_transfer(), Duration::from_secs(2))
            .await;
        match result {
            Err(LedgerError::Rejected(cause)) => assert!(cause.contains("nonce too low"), "{cause}"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepted_but_unconfirmed_times_out_with_hash() {
        let transfer = signed_transfer();
        let hash = transfer.tx_hash.to_string();
        let url = rpc_node(move |method| match method {
            "eth_sendRawTransaction" => Ok(json!(hash)),
            "eth_blockNumber" => Ok(json!("0x1")),
            _ => Ok(Value::Null),
        })
        .await;
        let client = client(url);

        let result = timeout(
            Duration::from_secs(5),
            client.submit_and_confirm(&transfer, Duration::from_millis(500)),
        )
        .await
        .expect("confirmation wait must respect its bound");
        assert!(matches!(result, Err(LedgerError::TimedOut(h)) if h == transfer.tx_hash));
    }

    #[tokio::test]
    async fn missing_receipt_is_pending() {
        let url = rpc_node(|_| Ok(Value::Null)).await;
        let status = client(url)
            .transaction_status(B256::repeat_byte(0x33))
            .await
            .unwrap();
        assert_eq!(status, TxStatus::Pending);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer endpoints.
//!
//! `POST /v1/transfers` blocks until the transfer is confirmed or its
//! confirmation wait runs out. A `504 timed_out` response carries the
//! transaction hash: poll `GET /v1/transfers/{tx_hash}` before retrying.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::wallets::require_phone,
    blockchain::{format_amount, TxStatus, NATIVE_DECIMALS, NATIVE_SYMBOL},
    error::ApiError,
    state::AppState,
};

/// Request to move funds between two phone-number wallets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Sender phone number.
    #[schema(example = "+919876543210")]
    pub from: Option<String>,
    /// Recipient phone number.
    #[schema(example = "+919812345678")]
    pub to: Option<String>,
    /// Amount in AVAX (e.g., "0.1").
    #[schema(example = "0.1")]
    pub amount: Option<String>,
}

/// Confirmed transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    /// Correlation id for logs.
    pub transfer_id: String,
    /// Transaction hash of the confirmed transfer.
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    /// Amount in AVAX.
    pub amount: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub explorer_url: String,
    pub message: String,
}

/// On-chain status of a transfer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferStatusResponse {
    pub tx_hash: String,
    #[serde(flatten)]
    pub status: TxStatus,
}

/// Transfer AVAX from one phone-number wallet to another.
#[utoipa::path(
    post,
    path = "/v1/transfers",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer confirmed", body = TransferResponse),
        (status = 400, description = "Missing parameters or invalid amount", body = crate::error::ErrorBody),
        (status = 404, description = "Sender or recipient has no wallet", body = crate::error::ErrorBody),
        (status = 422, description = "Insufficient funds", body = crate::error::ErrorBody),
        (status = 502, description = "Transaction failed", body = crate::error::ErrorBody),
        (status = 503, description = "Ledger unavailable, nothing submitted", body = crate::error::ErrorBody),
        (status = 504, description = "Submitted, outcome unknown; check status before retrying", body = crate::error::ErrorBody)
    )
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let (Some(from), Some(to), Some(amount)) = (
        request.from.as_deref(),
        request.to.as_deref(),
        request.amount.as_deref(),
    ) else {
        return Err(ApiError::bad_request("Missing parameters"));
    };
    let from = require_phone(Some(from))?;
    let to = require_phone(Some(to))?;

    let receipt = state.broker.transfer(&from, &to, amount).await?;
    let amount = format_amount(receipt.amount_wei, NATIVE_DECIMALS);

    Ok(Json(TransferResponse {
        transfer_id: receipt.transfer_id.to_string(),
        tx_hash: receipt.tx_hash.to_string(),
        from_address: receipt.from,
        to_address: receipt.to,
        message: format!("Sent {amount} {NATIVE_SYMBOL}"),
        amount,
        symbol: NATIVE_SYMBOL.to_string(),
        block_number: receipt.block_number,
        explorer_url: receipt.explorer_url,
    }))
}

/// Look up the on-chain status of a submitted transfer.
#[utoipa::path(
    get,
    path = "/v1/transfers/{tx_hash}",
    tag = "Transfers",
    params(
        ("tx_hash" = String, Path, description = "Transaction hash (0x + 64 hex chars)")
    ),
    responses(
        (status = 200, description = "Transfer status", body = TransferStatusResponse),
        (status = 400, description = "Malformed transaction hash", body = crate::error::ErrorBody),
        (status = 503, description = "Ledger unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn transfer_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<Json<TransferStatusResponse>, ApiError> {
    let status = state.broker.transfer_status(&tx_hash).await?;
    Ok(Json(TransferStatusResponse {
        tx_hash: tx_hash.trim().to_lowercase(),
        status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::SubmitBehavior;
    use crate::state::test_support::{test_context, TestContext};
    use alloy::primitives::U256;
    use axum::http::StatusCode;

    const ALICE: &str = "+15550100001";
    const BOB: &str = "+15550100002";

    fn fund_alice(ctx: &TestContext) {
        let alice = ctx.state.custody.get_or_create(ALICE).unwrap();
        ctx.state.custody.get_or_create(BOB).unwrap();
        ctx.ledger.set_balance(
            alice.public_address.parse().unwrap(),
            U256::from(5_000_000_000_000_000_000u64),
        );
    }

    fn request(from: &str, to: &str, amount: &str) -> Json<TransferRequest> {
        Json(TransferRequest {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            amount: Some(amount.to_string()),
        })
    }

    #[tokio::test]
    async fn transfer_returns_confirmed_receipt() {
        let ctx = test_context();
        fund_alice(&ctx);

        let Json(response) = create_transfer(State(ctx.state.clone()), request(ALICE, BOB, "1.0"))
            .await
            .unwrap();
        assert_eq!(response.amount, "1");
        assert_eq!(response.block_number, Some(1));
        assert_eq!(
            response.tx_hash,
            ctx.ledger.submitted()[0].tx_hash.to_string()
        );

        let Json(status) = transfer_status(State(ctx.state), Path(response.tx_hash.clone()))
            .await
            .unwrap();
        assert_eq!(status.status, TxStatus::Confirmed { block_number: Some(1) });
    }

    #[tokio::test]
    async fn missing_parameters_are_rejected() {
        let ctx = test_context();
        let err = create_transfer(
            State(ctx.state),
            Json(TransferRequest {
                from: Some(ALICE.to_string()),
                to: None,
                amount: Some("1".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "validation_error");
    }

    #[tokio::test]
    async fn timed_out_transfer_reports_hash() {
        let ctx = test_context();
        fund_alice(&ctx);
        ctx.ledger.set_behavior(SubmitBehavior::NeverConfirm);

        let err = create_transfer(State(ctx.state), request(ALICE, BOB, "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.tx_hash, Some(ctx.ledger.submitted()[0].tx_hash));
    }

    #[tokio::test]
    async fn unknown_recipient_is_not_found() {
        let ctx = test_context();
        fund_alice(&ctx);

        let err = create_transfer(State(ctx.state), request(ALICE, "+15550100999", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "recipient_not_found");
        assert!(ctx.ledger.submitted().is_empty());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet API endpoints.
//!
//! Wallets are addressed by the owner's phone number. Private keys never
//! leave custody; responses carry public addresses only.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::NATIVE_SYMBOL, custody::normalize_identifier, error::ApiError, state::AppState,
};

/// Request identifying a wallet by phone number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoneRequest {
    /// Phone number (E.164, optionally `whatsapp:`-prefixed).
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
}

/// Response after creating (or finding) a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletResponse {
    /// Checksummed wallet address.
    pub public_address: String,
    /// Whether this request generated the wallet.
    pub created: bool,
    pub message: String,
}

/// Wallet balance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub public_address: String,
    /// Balance in AVAX (e.g., "1.5").
    pub balance: String,
    /// Balance in wei.
    pub balance_raw: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressResponse {
    pub public_address: String,
}

/// Normalized phone number from a request, or a 400.
pub(crate) fn require_phone(phone: Option<&str>) -> Result<String, ApiError> {
    phone
        .and_then(normalize_identifier)
        .ok_or_else(|| ApiError::bad_request("Phone is required"))
}

/// Create a wallet for a phone number, or return the existing one.
///
/// Repeating the request never creates a second wallet.
#[utoipa::path(
    post,
    path = "/v1/wallets",
    tag = "Wallets",
    request_body = PhoneRequest,
    responses(
        (status = 201, description = "Wallet created", body = CreateWalletResponse),
        (status = 200, description = "Wallet already existed", body = CreateWalletResponse),
        (status = 400, description = "Missing or invalid phone", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody)
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> Result<(StatusCode, Json<CreateWalletResponse>), ApiError> {
    let phone = require_phone(request.phone.as_deref())?;
    let wallet = state.custody.get_or_create(&phone)?;

    let (status, message) = if wallet.created {
        (StatusCode::CREATED, "Wallet created successfully")
    } else {
        (StatusCode::OK, "Wallet already exists")
    };

    Ok((
        status,
        Json(CreateWalletResponse {
            public_address: wallet.public_address,
            created: wallet.created,
            message: message.to_string(),
        }),
    ))
}

/// Native balance of the wallet held for a phone number.
#[utoipa::path(
    post,
    path = "/v1/wallets/balance",
    tag = "Wallets",
    request_body = PhoneRequest,
    responses(
        (status = 200, description = "Wallet balance", body = BalanceResponse),
        (status = 400, description = "Missing or invalid phone", body = crate::error::ErrorBody),
        (status = 404, description = "Wallet not found", body = crate::error::ErrorBody),
        (status = 503, description = "Ledger unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn wallet_balance(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let phone = require_phone(request.phone.as_deref())?;
    let balance = state.broker.balance_of(&phone).await?;

    Ok(Json(BalanceResponse {
        balance: balance.formatted(),
        balance_raw: balance.wei.to_string(),
        public_address: balance.public_address,
        symbol: NATIVE_SYMBOL.to_string(),
    }))
}

/// Public address of the wallet held for a phone number.
#[utoipa::path(
    post,
    path = "/v1/wallets/address",
    tag = "Wallets",
    request_body = PhoneRequest,
    responses(
        (status = 200, description = "Wallet address", body = AddressResponse),
        (status = 400, description = "Missing or invalid phone", body = crate::error::ErrorBody),
        (status = 404, description = "Wallet not found", body = crate::error::ErrorBody)
    )
)]
pub async fn wallet_address(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<AddressResponse>, ApiError> {
    let phone = require_phone(request.phone.as_deref())?;
    let public_address = state.custody.public_address(&phone)?;
    Ok(Json(AddressResponse { public_address }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_context;

    fn phone(p: &str) -> Json<PhoneRequest> {
        Json(PhoneRequest {
            phone: Some(p.to_string()),
        })
    }

    #[tokio::test]
    async fn create_is_idempotent_per_phone() {
        let ctx = test_context();

        let (status, Json(first)) = create_wallet(State(ctx.state.clone()), phone("+15550100001"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(first.created);

        let (status, Json(second)) =
            create_wallet(State(ctx.state.clone()), phone("whatsapp:+15550100001"))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(!second.created);
        assert_eq!(first.public_address, second.public_address);
    }

    #[tokio::test]
    async fn missing_phone_is_bad_request() {
        let ctx = test_context();
        let err = create_wallet(
            State(ctx.state.clone()),
            Json(PhoneRequest { phone: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = wallet_address(State(ctx.state), phone("   "))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn address_and_balance_for_unknown_phone_are_not_found() {
        let ctx = test_context();
        let err = wallet_address(State(ctx.state.clone()), phone("+15550100009"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = wallet_balance(State(ctx.state), phone("+15550100009"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn balance_reports_avax_and_wei() {
        let ctx = test_context();
        let (_, Json(created)) = create_wallet(State(ctx.state.clone()), phone("+15550100001"))
            .await
            .unwrap();
        let address = created.public_address.parse().unwrap();
        ctx.ledger
            .set_balance(address, alloy::primitives::U256::from(1_500_000_000_000_000_000u64));

        let Json(balance) = wallet_balance(State(ctx.state), phone("+15550100001"))
            .await
            .unwrap();
        assert_eq!(balance.balance, "1.5");
        assert_eq!(balance.balance_raw, "1500000000000000000");
        assert_eq!(balance.symbol, "AVAX");
        assert_eq!(balance.public_address, created.public_address);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::B256;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::broker::TransferError;
use crate::custody::CustodyError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
    pub tx_hash: Option<B256>,
}

/// JSON error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
    /// Present when a transaction was submitted but its outcome is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            tx_hash: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "network_error", message)
    }

    /// Internal failure. Details go to the log, never to the caller.
    pub fn internal(details: impl std::fmt::Display) -> Self {
        error!(error = %details, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }

    pub fn with_tx_hash(mut self, tx_hash: B256) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

impl From<CustodyError> for ApiError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::InvalidIdentifier => ApiError::bad_request(err.to_string()),
            CustodyError::IdentityNotFound(_) => ApiError::not_found("Wallet not found"),
            other => ApiError::internal(other),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidAmount(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
            }
            TransferError::InvalidAddress(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_address", err.to_string())
            }
            TransferError::InvalidTxHash(_) => ApiError::bad_request(err.to_string()),
            TransferError::SenderNotFound => ApiError::not_found("Sender has no wallet"),
            TransferError::RecipientNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                "recipient_not_found",
                "Recipient has no wallet",
            ),
            TransferError::InsufficientFunds { .. } => {
                ApiError::unprocessable("insufficient_funds", err.to_string())
            }
            TransferError::Custody(custody) => ApiError::from(custody),
            TransferError::Network(_) => {
                ApiError::service_unavailable("Ledger is unavailable, try again later")
            }
            TransferError::TransactionFailed { tx_hash, cause } => {
                let api = ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "transaction_failed",
                    format!("Transaction failed: {cause}"),
                );
                match tx_hash {
                    Some(hash) => api.with_tx_hash(hash),
                    None => api,
                }
            }
            TransferError::TimedOut { tx_hash } => ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                "timed_out",
                "Transaction submitted but not confirmed in time; check its status before retrying",
            )
            .with_tx_hash(tx_hash),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
            tx_hash: self.tx_hash.map(|h| h.to_string()),
        });
        (self.status, body).into_response()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{blockchain::TxStatus, error::ErrorBody, state::AppState};

pub mod chat;
pub mod health;
pub mod transactions;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallets", post(wallets::create_wallet))
        .route("/wallets/balance", post(wallets::wallet_balance))
        .route("/wallets/address", post(wallets::wallet_address))
        .route("/transfers", post(transactions::create_transfer))
        .route("/transfers/{tx_hash}", get(transactions::transfer_status))
        .route("/chat/twilio", post(chat::twilio_webhook));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::readiness,
        wallets::create_wallet,
        wallets::wallet_balance,
        wallets::wallet_address,
        transactions::create_transfer,
        transactions::transfer_status,
        chat::twilio_webhook
    ),
    components(
        schemas(
            ErrorBody,
            TxStatus,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks,
            wallets::PhoneRequest,
            wallets::CreateWalletResponse,
            wallets::BalanceResponse,
            wallets::AddressResponse,
            transactions::TransferRequest,
            transactions::TransferResponse,
            transactions::TransferStatusResponse,
            chat::TwilioMessage
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Wallets", description = "Custodial wallets keyed by phone number"),
        (name = "Transfers", description = "Native AVAX transfers between wallets"),
        (name = "Chat", description = "WhatsApp bot webhook")
    )
)]
struct ApiDoc;

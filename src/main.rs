// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use phone_wallet_relay::{
    api::router,
    blockchain::{AvaxClient, Ledger, LedgerError},
    broker::TransactionBroker,
    config::{AppConfig, ConfigError, TlsPaths, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    custody::KeyCustodyManager,
    messaging::{Messenger, MessagingError, TwilioMessenger},
    state::AppState,
    storage::{IdentityDatabase, StoreError},
};

/// Grace period for in-flight requests and detached submissions on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("identity database error: {0}")]
    Storage(#[from] StoreError),

    #[error("ledger client error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("messaging client error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;

    info!(
        network = config.network.name,
        chain_id = config.network.chain_id,
        data_dir = %config.data_dir.display(),
        confirmation_timeout_secs = config.confirmation_timeout.as_secs(),
        invites = config.twilio.is_some(),
        tls = config.tls.is_some(),
        "Starting phone wallet relay"
    );

    let db = Arc::new(IdentityDatabase::open(&config.identity_db_path())?);
    info!(identities = db.count()?, "Identity database opened");

    let ledger: Arc<dyn Ledger> = Arc::new(AvaxClient::new(config.network.clone())?);
    match ledger.latest_block().await {
        Ok(block) => info!(latest_block = block, "Ledger reachable"),
        Err(e) => warn!(error = %e, "Ledger not reachable yet; /ready will report degraded"),
    }

    let messenger: Option<Arc<dyn Messenger>> = match config.twilio.clone() {
        Some(twilio) => Some(Arc::new(TwilioMessenger::new(twilio)?) as Arc<dyn Messenger>),
        None => {
            info!("Twilio not configured; invites disabled");
            None
        }
    };

    let tls = config.tls.clone();
    let AppConfig {
        master_key,
        confirmation_timeout,
        ..
    } = config;

    let custody = Arc::new(KeyCustodyManager::new(db, master_key));
    let broker = Arc::new(TransactionBroker::new(
        custody.clone(),
        ledger,
        confirmation_timeout,
    ));
    let app = router(AppState::new(custody, broker.clone(), messenger));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    match tls {
        Some(paths) => serve_tls(app, addr, &paths, shutdown).await?,
        None => serve_http(app, addr, shutdown).await?,
    }

    if !broker.drain(SHUTDOWN_GRACE).await {
        warn!(
            in_flight = broker.in_flight(),
            "Submissions still pending at shutdown; check their status after restart"
        );
    }

    info!("Server stopped");
    Ok(())
}

async fn serve_http(
    app: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

async fn serve_tls(
    app: Router,
    addr: SocketAddr,
    paths: &TlsPaths,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    // Install the ring crypto provider for rustls before any TLS operation.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    let tls_config = RustlsConfig::from_pem_file(&paths.cert_path, &paths.key_path).await?;

    let handle = axum_server::Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    info!("Listening on https://{addr} (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use coreum_server::{
    api::router,
    blockchain::CoreumClient,
    config::{ServiceConfig, LOG_FORMAT_ENV},
    secrets::{JsonSecretProvider, SecretCache},
    state::AppState,
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            eprintln!("coreum-server: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;
    tracing::info!(
        stage = %config.stage,
        chain_id = %config.network.chain_id,
        rest_url = %config.network.rest_url,
        rpc_url = %config.network.rpc_url,
        "Loaded configuration"
    );

    let client = CoreumClient::new(&config.network.rest_url, &config.network.rpc_url)?;
    let provider = JsonSecretProvider::from_env()?;
    tracing::info!(secrets = provider.len(), "Loaded secret provider");
    let secrets = Arc::new(SecretCache::new(Arc::new(provider)));

    let state = AppState::new(&config, Arc::new(client), secrets);
    let app = router(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Coreum server listening (docs at /docs)"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` filter, `LOG_FORMAT=json` for structured output.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        Registry::default().with(filter).with(fmt::layer()).init();
    }
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

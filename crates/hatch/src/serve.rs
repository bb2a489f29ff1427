// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hatch serve`: wire storage, delivery, and intake behind the gateway.

use std::sync::Arc;
use std::time::Duration;

use hatch_config::model::HatchConfig;
use hatch_core::{ConversationStore, HatchError, PluginAdapter};
use hatch_delivery::{DeliveryClients, HttpTransport};
use hatch_gateway::{start_server, GatewayState};
use hatch_intake::IntakeService;
use hatch_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::shutdown;

/// Runs the gateway until SIGINT/SIGTERM, then drains and checkpoints.
pub async fn run_serve(config: HatchConfig) -> Result<(), HatchError> {
    init_tracing(&config.server.log_level);

    info!("starting hatch serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage ready");

    let transport = Arc::new(HttpTransport::new(Duration::from_secs(
        config.delivery.request_timeout_secs,
    ))?);
    let clients = DeliveryClients::from_config(&config.delivery, transport);
    for (name, provider) in [("sms", &config.delivery.sms), ("email", &config.delivery.email)] {
        if provider.api_key.is_none() {
            warn!(provider = name, "no API key configured; provider will likely reject sends");
        }
    }

    let store: Arc<dyn ConversationStore> = storage.clone();
    let intake = Arc::new(IntakeService::new(store, clients));

    let signal = shutdown::install_signal_handler();
    let request_cancel = CancellationToken::new();
    let state = GatewayState::new(intake, request_cancel.clone());

    let server_config = config.server.clone();
    let server_shutdown = signal.clone();
    let mut server = tokio::spawn(async move {
        start_server(&server_config, state, server_shutdown).await
    });

    let early_exit = tokio::select! {
        // Exited before any signal, e.g. the bind failed.
        joined = &mut server => Some(joined),
        _ = signal.cancelled() => None,
    };

    let outcome = match early_exit {
        Some(joined) => flatten_join(joined),
        None => {
            let grace = Duration::from_secs(config.server.shutdown_grace_secs);
            info!(grace_secs = grace.as_secs(), "draining in-flight requests");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => flatten_join(joined),
                Err(_) => {
                    warn!("grace period elapsed, cancelling in-flight requests");
                    request_cancel.cancel();
                    flatten_join(server.await)
                }
            }
        }
    };

    if let Err(e) = storage.shutdown().await {
        error!(error = %e, "WAL checkpoint on shutdown failed");
    }

    outcome?;
    info!("hatch serve shutdown complete");
    Ok(())
}

fn flatten_join(
    joined: Result<Result<(), HatchError>, tokio::task::JoinError>,
) -> Result<(), HatchError> {
    joined.map_err(|e| HatchError::Internal(format!("gateway task failed: {e}")))?
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hatch={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_join_passes_server_errors_through() {
        let err = flatten_join(Ok(Err(HatchError::Internal("bind".into())))).unwrap_err();
        assert!(matches!(err, HatchError::Internal(m) if m == "bind"));
        assert!(flatten_join(Ok(Ok(()))).is_ok());
    }

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing("debug");
        init_tracing("info");
    }
}

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use imagine_core::history::History;
use imagine_sdapi::api::StableDiffusionApi;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagine_api::config::AppConfig;
use imagine_api::router::build_app_router;
use imagine_api::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "imagine_api=debug,imagine_queue=debug,imagine_sdapi=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // --- Configuration ---
    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        sd_api_host = %config.sdapi.host,
        history_capacity = config.queue.history_capacity,
        "Loaded configuration",
    );

    // --- Render backend ---
    let backend = Arc::new(StableDiffusionApi::new(config.sdapi.clone())?);

    // --- App state ---
    let state = AppState::new(backend, History::new(config.queue.history_capacity));

    // --- Render worker ---
    let worker_cancel = CancellationToken::new();
    let worker = state
        .worker()
        .with_progress_interval(config.queue.progress_poll_interval);
    let worker_handle = tokio::spawn({
        let cancel = worker_cancel.clone();
        async move { worker.run(cancel).await }
    });

    // --- Start server ---
    let app = build_app_router(state, &config.server);
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, waiting for the render worker");

    worker_cancel.cancel();
    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    drain_worker(worker_handle, timeout).await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for the render worker to wind down. Returns `true` on a clean exit.
async fn drain_worker(handle: JoinHandle<()>, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Render worker terminated abnormally");
            false
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Render worker did not finish in time",
            );
            false
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

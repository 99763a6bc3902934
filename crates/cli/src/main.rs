//! smartjob-trigger entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration**: read [`trigger::GatewayConfig`] and
//!    [`runner::RunnerConfig`] from the environment, failing fast on anything
//!    missing or malformed.
//! 2. **Wire observability**: configure `tracing-subscriber` with a JSON layer
//!    and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP
//!    exporter.
//! 3. **Construct infrastructure**: create the [`runner::HttpJobRunner`] and
//!    inject it into the [`listener`] state.
//! 4. **Serve** until Ctrl-C or SIGTERM, then drain in-flight requests.

#[macro_use]
extern crate tracing;

use std::sync::Arc;

use anyhow::{Context, Result};
use listener::AppState;
use runner::{HttpJobRunner, RunnerConfig};
use tokio::net::TcpListener;
use trigger::GatewayConfig;

mod observability;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env().context("loading gateway configuration")?;
    let runner_config = RunnerConfig::from_env().context("loading job runner configuration")?;
    let address = settings::listen_address(std::env::var(settings::PORT_VAR).ok().as_deref())?;

    let telemetry = observability::initialize_tracing(config.log_level)?;

    info!(
        project = %config.job.placement.project,
        region = %config.job.placement.region,
        image = %config.job.container_image,
        runner = %runner_config.base_url,
        "configuration loaded"
    );

    let runner = Arc::new(HttpJobRunner::new(runner_config));
    let state = AppState::new(&config, runner);

    let socket = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {address}"))?;
    let served = listener::serve(socket, state, shutdown_signal()).await;

    info!("smartjob-trigger stopped");
    telemetry.shutdown();
    served.context("serving HTTP")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!("failed to listen for SIGTERM: {}", error);
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
    info!("shutdown requested");
}

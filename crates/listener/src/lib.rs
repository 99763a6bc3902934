//! smartjob-trigger webhook receiver.
//!
//! Binds an HTTP server that accepts cloud-storage notifications and turns
//! each one into a job launch:
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /` | Health check, answers `{"message": "Hello World"}` |
//! | `POST /schedule/{namespace}/{name}` | Submit the job and return immediately |
//! | `POST /run/{namespace}/{name}` | Submit the job and wait for it to finish |
//!
//! Failures are answered with `{"detail": "..."}`: `400` for bodies that are
//! not JSON or not a recognized event, `500` when a run-mode job fails, `502`
//! when the Job Runner cannot be reached.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, body parsing and status-code mapping live
//! here. Event validation, request building and dispatch are delegated to the
//! [`trigger`] crate.

#[macro_use]
extern crate tracing;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use trigger::{Dispatcher, GatewayConfig, JobDefaults, JobRunner};

mod error;
mod handlers;
mod route;

pub use error::GatewayError;
pub use handlers::TriggerResponse;
pub use route::Route;

/// Read-only state shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub defaults: Arc<JobDefaults>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: &GatewayConfig, runner: Arc<dyn JobRunner>) -> Self {
        Self {
            defaults: Arc::new(config.job.clone()),
            dispatcher: Dispatcher::new(runner),
        }
    }
}

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(&Route::Hello.to_string(), get(handlers::hello))
        .route(&Route::Schedule.to_string(), post(handlers::schedule))
        .route(&Route::Run.to_string(), post(handlers::run))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the gateway on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!(%address, "smartjob-trigger listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

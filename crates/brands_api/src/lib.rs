//! HTTP surface for the brands registry.
//!
//! # Responsibility
//! - Translate HTTP requests into `brands_core` gateway calls.
//! - Map gateway outcomes to status codes and JSON bodies.
//! - Own process-level concerns: configuration, CORS, serving.

use std::future::Future;

use tokio::net::TcpListener;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

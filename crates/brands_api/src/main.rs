//! Brands API server entry point.
//!
//! Loads `.env`, builds the configuration, initializes logging, opens the
//! migrated connection pool and serves until Ctrl-C / SIGTERM.

use brands_api::{serve, AppConfig, AppState};
use brands_core::{init_logging, open_pool, BrandService};
use log::{error, info};
use std::process::ExitCode;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("brands_api: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("brands_api: {err}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=api status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let database = config.database.clone();
    let pool_options = config.pool.clone();
    let pool = tokio::task::spawn_blocking(move || open_pool(&database, &pool_options)).await??;

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=api status=ok addr={} debug={} cors_origins={}",
        listener.local_addr()?,
        config.debug,
        config.cors_allow_origins.join(",")
    );

    let state = AppState::new(BrandService::new(pool), config);
    serve(listener, state, shutdown_signal()).await?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=signal_install module=api status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("event=signal_install module=api status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("event=server_shutdown module=api status=start");
}

//! usemon standalone runner.
//!
//! Loads the config, starts the engine with the configured built-in adapter,
//! and flushes everything on Ctrl-C / SIGTERM. Useful to validate a config and
//! its adapter wiring outside the host application.
//!
//! - Config path: `USEMON_CONFIG` (default `usemon.yaml`)
//! - Log filter: `RUST_LOG`

use tracing_subscriber::{fmt, EnvFilter};

use usemon_engine::{config, Monitor};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("USEMON_CONFIG").unwrap_or_else(|_| "usemon.yaml".to_string());

    let monitor = match config::load_from_file(&path).and_then(|cfg| Monitor::from_config(&cfg)) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(%path, code = e.code().as_str(), error = %e, "monitoring failed to start");
            std::process::exit(1);
        }
    };

    if !monitor.is_enabled() {
        tracing::info!(%path, "monitoring disabled in config; nothing to do");
        return;
    }

    shutdown_signal().await;

    if let Err(e) = monitor.close().await {
        tracing::error!(error = %e, "final flush failed");
        std::process::exit(2);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, flushing metrics");
}

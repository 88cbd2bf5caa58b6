//! loanstat service binary.
//!
//! - Config: optional YAML file + `JSON_LOGS` / `LOG_LEVEL` / `DATABASE_URL` /
//!   `LISTEN_ADDR` environment overrides, read once
//! - Logging: one record per line on stdout (JSON or plain)
//! - Graceful shutdown on Ctrl+C / SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use loanstat_core::error::{LoanstatError, Result};
use loanstat_service::{app_state, config, db::PgDatabase, obs::logging, router};

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::var(config::CONFIG_PATH_ENV).unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.into());
    let cfg = config::load(&path, |k| std::env::var(k).ok())?;

    logging::init(logging::LogFormat::from_json_flag(cfg.logging.json), cfg.logging.max_level()?)?;

    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| LoanstatError::BadRequest(format!("server.listen: {e}")))?;

    let db = PgDatabase::connect_lazy(&cfg.database)?;
    let state = app_state::AppState::new(Arc::new(db));
    let app = router::build_router(state);

    tracing::info!(%listen, "loanstat-service starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| LoanstatError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LoanstatError::Internal(format!("server failed: {e}")))?;

    tracing::info!("loanstat-service stopped");
    Ok(())
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
            Ok(mut sig) => {
                sig.recv().await;
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
    tracing::info!("shutdown signal received");
}

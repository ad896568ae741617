use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use zield::{config::Config, db, records, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("zield=info,tower_http=info")),
        )
        .init();

    let config = Config::load().context("loading configuration")?;
    info!("Configuration: {:?}", &config);

    let conn = db::open_db(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;
    let state = AppState::new(config, conn)?;

    if let Some(admin) = state.config.default_admin.clone() {
        records::teachers::ensure_default_admin(&state, &admin)
            .await
            .context("ensuring default admin")?;
    }

    let address = format!("0.0.0.0:{}", state.config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, zield::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
